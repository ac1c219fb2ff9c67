use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use rfid_attendance::kiosk::presentation::DisplayState;
use rfid_attendance::kiosk::reader::{LinkOpener, ReaderSettings, SerialLink};
use rfid_attendance::kiosk::render::ConsoleRenderer;
use rfid_attendance::kiosk::{Pipeline, ScanDispatcher, UiDriver};
use rfid_attendance::model::scan_log::ScanAction;

/// Device that prints its chunks once, then stays idle.
struct ScriptedLink {
    chunks: VecDeque<Vec<u8>>,
}

impl SerialLink for ScriptedLink {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.chunks.front().map_or(0, Vec::len))
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let chunk = self.chunks.pop_front().unwrap_or_default();
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

struct ScriptedOpener {
    script: Option<Vec<&'static [u8]>>,
}

impl LinkOpener for ScriptedOpener {
    type Link = ScriptedLink;

    fn open(&mut self) -> io::Result<ScriptedLink> {
        let script = self
            .script
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "already opened"))?;
        Ok(ScriptedLink {
            chunks: script.into_iter().map(<[u8]>::to_vec).collect(),
        })
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Answers every request with a clock-in reply and counts them.
async fn attendance_service(requests: Arc<AtomicUsize>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/scan", listener.local_addr().unwrap());
    let body = r#"{"success":true,"action":"clock_in","message":"Welcome Jane Doe! Clocked in successfully.","user":{"name":"Jane Doe","department":"Engineering"},"timestamp":"2026-03-02T09:00:00"}"#;

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let requests = requests.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                let mut chunk = [0u8; 1024];
                // The JSON body is sent last and ends with '}'.
                while !seen.ends_with(b"}") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => seen.extend_from_slice(&chunk[..n]),
                    }
                }
                requests.fetch_add(1, Ordering::SeqCst);
                let reply = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(reply.as_bytes()).await.ok();
                stream.shutdown().await.ok();
            });
        }
    });
    url
}

#[tokio::test]
async fn tap_flows_from_serial_line_to_success_screen() {
    let requests = Arc::new(AtomicUsize::new(0));
    let url = attendance_service(requests.clone()).await;

    let opener = ScriptedOpener {
        script: Some(vec![
            &b"MFRC522 firmware v2\r\n"[..],
            &b"Card UID: 04 A1 B2 C3\r\n"[..],
            &b"Card UID: 04 A1 B2 C3\r\n"[..],
        ]),
    };
    let settings = ReaderSettings {
        reconnect_delay: Duration::from_millis(10),
        poll_interval: Duration::from_millis(1),
        error_pause: Duration::from_millis(10),
    };
    let mut pipeline = Pipeline::start_with(opener, Duration::from_secs(2), 0, settings).unwrap();

    let dispatcher = ScanDispatcher::new(&url, Duration::from_secs(5), 4).unwrap();
    let mut driver = UiDriver::new(
        Duration::from_secs(3),
        dispatcher,
        ConsoleRenderer::new(Vec::new()),
    );

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut shown = None;
    while Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
        driver.tick(pipeline.events(), Instant::now());
        if let DisplayState::Success { action, name, time, .. } = driver.presentation().state() {
            shown = Some((*action, name.clone(), time.clone()));
            break;
        }
    }

    // Give a stray second dispatch time to land before counting.
    tokio::time::sleep(Duration::from_millis(100)).await;
    driver.tick(pipeline.events(), Instant::now());
    pipeline.stop();

    assert_eq!(
        shown,
        Some((ScanAction::ClockIn, "Jane Doe".to_string(), "09:00:00".to_string()))
    );
    assert_eq!(requests.load(Ordering::SeqCst), 1);
    assert!(!pipeline.is_running());
}
