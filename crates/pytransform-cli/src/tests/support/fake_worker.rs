//! Fake transformation worker for client and dispatcher tests.
//!
//! Serves a scripted sequence of HTTP replies on an ephemeral loopback port.
//! Connections that close without sending a request (reachability probes)
//! do not consume a reply.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use pytransform_config::ServiceEndpoint;
use serde_json::Value;

const IDLE_DEADLINE: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// How the fake worker answers one request.
pub(crate) enum Reply {
    /// Writes a complete HTTP response.
    Respond { status: u16, body: String },
    /// Reads the request, then closes the connection without answering.
    Drop,
    /// Reads the request, runs the hook, then closes without answering.
    DropAfter(Box<dyn FnOnce() + Send>),
    /// Reads the request and holds the connection open for the duration.
    Stall(Duration),
}

impl Reply {
    pub(crate) fn json(value: &Value) -> Self {
        Self::Respond {
            status: 200,
            body: value.to_string(),
        }
    }

    pub(crate) fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Respond {
            status,
            body: body.into(),
        }
    }
}

/// A scripted HTTP worker.
pub(crate) struct FakeWorker {
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl FakeWorker {
    pub(crate) fn spawn(replies: Vec<Reply>) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake worker")?;
        listener
            .set_nonblocking(true)
            .context("fake worker nonblocking")?;
        let port = listener.local_addr().context("local addr")?.port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let requests = Arc::clone(&requests);
            let stop = Arc::clone(&stop);
            thread::spawn(move || serve(&listener, replies.into(), &requests, &stop))
        };
        Ok(Self {
            port,
            requests,
            stop,
            handle: Some(handle),
        })
    }

    pub(crate) fn endpoint(&self) -> ServiceEndpoint {
        ServiceEndpoint::http("127.0.0.1", self.port, "/process_code")
    }

    /// Request bodies received so far.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Request bodies parsed as JSON.
    pub(crate) fn json_requests(&self) -> Result<Vec<Value>> {
        self.requests()
            .iter()
            .map(|body| serde_json::from_str(body).context("request body is JSON"))
            .collect()
    }
}

impl Drop for FakeWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(
    listener: &TcpListener,
    mut replies: VecDeque<Reply>,
    requests: &Mutex<Vec<String>>,
    stop: &AtomicBool,
) {
    let mut deadline = Instant::now() + IDLE_DEADLINE;
    while !replies.is_empty() && !stop.load(Ordering::SeqCst) && Instant::now() < deadline {
        match listener.accept() {
            Ok((stream, _)) => {
                deadline = Instant::now() + IDLE_DEADLINE;
                let Ok(Some(body)) = read_request(&stream) else {
                    continue;
                };
                if let Ok(mut guard) = requests.lock() {
                    guard.push(body);
                }
                if let Some(reply) = replies.pop_front() {
                    let _ = answer(stream, reply);
                }
            }
            Err(ref error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(_) => return,
        }
    }
}

fn read_request(stream: &TcpStream) -> io::Result<Option<String>> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line)? == 0 {
        return Ok(None);
    }

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header == "\r\n" {
            break;
        }
        if let Some((name, value)) = header.split_once(':')
            && name.trim().eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;
    Ok(Some(String::from_utf8_lossy(&body).into_owned()))
}

fn answer(mut stream: TcpStream, reply: Reply) -> io::Result<()> {
    match reply {
        Reply::Respond { status, body } => {
            let reason = if status == 200 { "OK" } else { "Error" };
            write!(
                stream,
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )?;
            stream.flush()
        }
        Reply::Drop => Ok(()),
        Reply::DropAfter(hook) => {
            hook();
            Ok(())
        }
        Reply::Stall(duration) => {
            thread::sleep(duration);
            Ok(())
        }
    }
}
