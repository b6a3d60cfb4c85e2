//! Outbound stream publisher using TCP sockets.
//!
//! Relays records to any number of subscribers. Producer-side handlers never
//! block on the network: they serialize, then push onto a bounded lock-free
//! queue. A dedicated publisher thread owns the listener, accepts subscribers,
//! and broadcasts queued frames to all of them.
//!
//! When the queue is full the oldest pending message is discarded so the
//! subscribers always see the most recent data.

use crate::error::{Error, Result};
use crate::streaming::wire::{Serializer, encode_frame};
use crossbeam_queue::ArrayQueue;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Maximum frames broadcast per loop iteration before accepting again
const BATCH_LIMIT: usize = 64;

/// Subscribers that stall longer than this on a write are dropped
const CLIENT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// A serialized message waiting for broadcast.
#[derive(Debug)]
struct Envelope {
    topic: String,
    payload: Vec<u8>,
}

/// State shared between the publisher thread and its handles.
struct Shared {
    queue: ArrayQueue<Envelope>,
    serializer: Serializer,
    dropped: AtomicU64,
    clients: AtomicUsize,
}

/// Cloneable entry point for pushing messages onto the outbound queue.
#[derive(Clone)]
pub struct PublisherHandle {
    shared: Arc<Shared>,
}

impl PublisherHandle {
    /// Serialize `message` and queue it for broadcast on `topic`.
    ///
    /// Never blocks. If the queue is full the oldest queued message is
    /// discarded.
    pub fn publish<T: Serialize>(&self, topic: &str, message: &T) -> Result<()> {
        let payload = self.shared.serializer.serialize(message)?;
        let envelope = Envelope {
            topic: topic.to_string(),
            payload,
        };

        if let Some(evicted) = self.shared.queue.force_push(envelope) {
            let dropped = self.shared.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped == 1 || dropped % 100 == 0 {
                warn!(
                    "Outbound queue full, dropped oldest message on {} ({} total)",
                    evicted.topic, dropped
                );
            }
        }
        Ok(())
    }

    /// Messages discarded because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Messages currently waiting for broadcast.
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }
}

/// Publisher that broadcasts relayed streams to TCP subscribers
pub struct TcpPublisher {
    shared: Arc<Shared>,
    local_addr: SocketAddr,
    publisher_thread: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl TcpPublisher {
    /// Bind `bind_address` and start the publisher thread.
    ///
    /// The listener is bound before this returns, so bind failures surface
    /// here rather than in the background thread.
    pub fn bind(bind_address: &str, capacity: usize, serializer: Serializer) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidParameter(
                "publisher queue capacity must be positive".to_string(),
            ));
        }

        let listener = TcpListener::bind(bind_address)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let shared = Arc::new(Shared {
            queue: ArrayQueue::new(capacity),
            serializer,
            dropped: AtomicU64::new(0),
            clients: AtomicUsize::new(0),
        });
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread_shared = Arc::clone(&shared);
        let thread_shutdown = Arc::clone(&shutdown);
        let publisher_thread = thread::Builder::new()
            .name("tcp-publisher".to_string())
            .spawn(move || {
                if let Err(e) = Self::publisher_thread_loop(listener, thread_shared, thread_shutdown)
                {
                    error!("Publisher thread error: {}", e);
                }
            })
            .map_err(|e| Error::Thread(format!("failed to spawn publisher: {}", e)))?;

        info!(
            "TCP publisher listening on {} (queue {}, {:?})",
            local_addr,
            capacity,
            serializer.format()
        );

        Ok(Self {
            shared,
            local_addr,
            publisher_thread: Some(publisher_thread),
            shutdown,
        })
    }

    /// Publisher thread main loop - owns the TCP listener
    fn publisher_thread_loop(
        listener: TcpListener,
        shared: Arc<Shared>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<()> {
        let mut clients: Vec<TcpStream> = Vec::new();
        let mut published = 0u64;

        // Reused for every frame
        let mut frame_buffer = Vec::with_capacity(64 * 1024);

        while !shutdown.load(Ordering::Relaxed) {
            loop {
                match listener.accept() {
                    Ok((stream, addr)) => match Self::prepare_client(&stream) {
                        Ok(()) => {
                            info!("Subscriber connected: {}", addr);
                            clients.push(stream);
                        }
                        Err(e) => warn!("Failed to configure subscriber {}: {}", addr, e),
                    },
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                    Err(e) => {
                        error!("Error accepting subscriber: {}", e);
                        break;
                    }
                }
            }
            shared.clients.store(clients.len(), Ordering::Relaxed);

            let mut batch = 0;
            while let Some(envelope) = shared.queue.pop() {
                match encode_frame(&envelope.topic, &envelope.payload, &mut frame_buffer) {
                    Ok(()) => {
                        Self::broadcast_to_clients(&mut clients, &frame_buffer);
                        published += 1;
                        if published % 1000 == 0 {
                            debug!("Published {} messages", published);
                        }
                    }
                    Err(e) => warn!("Dropping message on {}: {}", envelope.topic, e),
                }

                batch += 1;
                if batch >= BATCH_LIMIT {
                    break;
                }
            }
            shared.clients.store(clients.len(), Ordering::Relaxed);

            if shared.queue.is_empty() {
                thread::sleep(Duration::from_millis(10));
            }
        }

        info!(
            "Publisher thread exiting ({} published, {} dropped)",
            published,
            shared.dropped.load(Ordering::Relaxed)
        );
        Ok(())
    }

    fn prepare_client(stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nonblocking(false)?;
        stream.set_write_timeout(Some(CLIENT_WRITE_TIMEOUT))?;
        stream.set_nodelay(true)
    }

    /// Write one encoded frame to every subscriber, dropping those that fail.
    fn broadcast_to_clients(clients: &mut Vec<TcpStream>, frame: &[u8]) {
        clients.retain_mut(|client| match client.write_all(frame) {
            Ok(_) => true,
            Err(e) => {
                if let Ok(addr) = client.peer_addr() {
                    info!("Subscriber {} disconnected: {}", addr, e);
                } else {
                    debug!("Subscriber disconnected: {}", e);
                }
                false
            }
        });
    }

    /// Handle for queuing messages from other threads.
    pub fn handle(&self) -> PublisherHandle {
        PublisherHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of currently connected subscribers.
    pub fn client_count(&self) -> usize {
        self.shared.clients.load(Ordering::Relaxed)
    }

    /// Stop the publisher
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        info!("TCP publisher shutdown requested");
    }
}

impl Drop for TcpPublisher {
    fn drop(&mut self) {
        self.stop();

        if let Some(thread) = self.publisher_thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streaming::wire::{WireFormat, create_serializer};

    #[test]
    fn test_zero_capacity_rejected() {
        let result = TcpPublisher::bind("127.0.0.1:0", 0, create_serializer(WireFormat::Json));
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let shared = Arc::new(Shared {
            queue: ArrayQueue::new(2),
            serializer: create_serializer(WireFormat::Json),
            dropped: AtomicU64::new(0),
            clients: AtomicUsize::new(0),
        });
        let handle = PublisherHandle {
            shared: Arc::clone(&shared),
        };

        handle.publish("/t", &1u32).unwrap();
        handle.publish("/t", &2u32).unwrap();
        handle.publish("/t", &3u32).unwrap();

        assert_eq!(handle.dropped_count(), 1);
        assert_eq!(handle.pending(), 2);
        let first = shared.queue.pop().unwrap();
        assert_eq!(first.payload, b"2");
        let second = shared.queue.pop().unwrap();
        assert_eq!(second.payload, b"3");
    }

    #[test]
    fn test_reports_bound_port() {
        let publisher =
            TcpPublisher::bind("127.0.0.1:0", 8, create_serializer(WireFormat::Json)).unwrap();
        assert_ne!(publisher.local_addr().port(), 0);
        assert_eq!(publisher.client_count(), 0);
    }
}
