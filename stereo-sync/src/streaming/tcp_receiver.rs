//! Inbound stream receiver for producer connections
//!
//! Producers (the camera driver, the calibration loader, the robot's velocity
//! source) connect to the inbound port and push topic-tagged frames. Each
//! connection gets its own thread, so a slow producer never stalls the others.
//!
//! # Connection Lifecycle
//!
//! ```text
//! 1. Producer connects to the inbound port
//! 2. accept_loop spawns a TcpReceiver thread for this connection
//! 3. Receiver reads frames and hands each one to the FrameHandler
//! 4. On disconnect or framing error the connection is closed
//! ```
//!
//! # Failure Handling
//!
//! - **Read timeout**: 500ms timeout allows periodic shutdown flag checks
//! - **Stalled frame**: a producer silent mid-frame for `STALL_TIMEOUT` is
//!   dropped, so shutdown never waits on a half-sent frame
//! - **Handler error**: logged, frame discarded, connection stays open
//! - **Framing error**: connection closed (stream position is unrecoverable)

use crate::error::{Error, Result};
use crate::streaming::wire::read_frame;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Initial capacity for the frame read buffer
const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Consumer of decoded inbound frames.
///
/// Called concurrently from one thread per producer connection.
pub trait FrameHandler: Send + Sync {
    fn handle_frame(&self, topic: &str, payload: &[u8]) -> Result<()>;
}

/// TCP receiver that feeds frames from one producer connection to a handler
pub struct TcpReceiver<H: FrameHandler> {
    handler: Arc<H>,
    /// Global running flag (daemon shutdown)
    running: Arc<AtomicBool>,
    /// Reused across frames
    read_buffer: Vec<u8>,
    frames: u64,
}

impl<H: FrameHandler> TcpReceiver<H> {
    pub fn new(handler: Arc<H>, running: Arc<AtomicBool>) -> Self {
        Self {
            handler,
            running,
            read_buffer: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            frames: 0,
        }
    }

    /// Run the receiver loop until the producer disconnects or shutdown.
    pub fn run(&mut self, mut stream: TcpStream) -> Result<()> {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        log::info!("Producer connected: {}", peer);

        if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            log::warn!("Failed to set read timeout: {}", e);
        }

        let result = loop {
            if !self.running.load(Ordering::Relaxed) {
                log::debug!("Running flag cleared, closing {}", peer);
                break Ok(());
            }

            match read_frame(&mut stream, &mut self.read_buffer) {
                Ok(Some(frame)) => {
                    self.frames += 1;
                    if let Err(e) = self.handler.handle_frame(frame.topic, frame.payload) {
                        log::warn!("Discarding frame on {} from {}: {}", frame.topic, peer, e);
                    }
                }
                Ok(None) => {
                    // Idle; loop to re-check the running flag
                }
                Err(Error::Io(ref io_err))
                    if matches!(
                        io_err.kind(),
                        std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::ConnectionReset
                    ) =>
                {
                    log::info!("Producer {} disconnected", peer);
                    break Ok(());
                }
                Err(Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::TimedOut => {
                    log::warn!("Closing stalled producer {}: {}", peer, io_err);
                    break Err(Error::Io(io_err));
                }
                Err(e) => {
                    log::error!("Closing {} after read failure: {}", peer, e);
                    break Err(e);
                }
            }
        };

        let _ = stream.shutdown(Shutdown::Both);
        log::debug!("Receiver for {} stopped after {} frames", peer, self.frames);
        result
    }

    /// Frames read on this connection so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

/// Accept producer connections until `running` is cleared.
///
/// Each connection is served by its own named thread; all of them are joined
/// before this returns.
pub fn accept_loop<H: FrameHandler + 'static>(
    listener: TcpListener,
    handler: Arc<H>,
    running: Arc<AtomicBool>,
) -> Result<()> {
    listener.set_nonblocking(true)?;
    let mut workers: Vec<JoinHandle<()>> = Vec::new();
    let mut connection_id = 0u64;

    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                if let Err(e) = stream.set_nonblocking(false) {
                    log::error!("Failed to set {} to blocking mode: {}", addr, e);
                    continue;
                }

                connection_id += 1;
                let mut receiver = TcpReceiver::new(Arc::clone(&handler), Arc::clone(&running));
                let spawned = thread::Builder::new()
                    .name(format!("tcp-receiver-{}", connection_id))
                    .spawn(move || {
                        if let Err(e) = receiver.run(stream) {
                            log::error!("Receiver error for {}: {}", addr, e);
                        }
                    });

                match spawned {
                    Ok(handle) => workers.push(handle),
                    Err(e) => log::error!("Failed to spawn receiver for {}: {}", addr, e),
                }
                workers.retain(|w| !w.is_finished());
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                log::error!("Accept error: {}", e);
            }
        }
    }

    log::info!("Waiting for {} receiver threads", workers.len());
    for worker in workers {
        if worker.join().is_err() {
            log::error!("Receiver thread panicked");
        }
    }
    Ok(())
}
