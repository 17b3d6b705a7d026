//! Readiness-driven TCP server
//!
//! One thread owns everything: the listener, every client connection and the
//! three typed stores. [`mio::Poll`] reports which descriptors are ready;
//! the loop accepts, reads one command per readiness event, executes it and
//! writes the framed reply back on the same descriptor. Commands therefore
//! execute atomically with respect to one another, and no locking exists
//! anywhere in the keyspace.
//!
//! Before each wait the loop checks whether the maintenance interval has
//! elapsed and, if so, runs an active expiration sweep.

use log::{debug, error, info, warn};
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use minnow_core::resp::Frame;
use minnow_core::{Error, Result};

use crate::command::{Command, Store};
use crate::config::ServerConfig;
use crate::expire::purge_expired_keys;

const LISTENER: Token = Token(0);

/// One readiness event reads at most this many bytes, treated as one command
const READ_BUFFER_SIZE: usize = 4096;

/// A single-threaded key-value server
pub struct Server {
    poll: Poll,
    listener: TcpListener,
    connections: HashMap<Token, TcpStream>,
    next_token: usize,
    store: Store,
    config: ServerConfig,
    last_purge: Instant,
}

impl Server {
    /// Binds the listening socket and registers it with the poller
    ///
    /// # Errors
    ///
    /// Returns an error when the address does not parse or the socket cannot
    /// be bound or registered. These are fatal: there is no server to run.
    pub fn bind(config: ServerConfig) -> Result<Server> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|_| Error::Config(format!("invalid listen address {}:{}", config.host, config.port)))?;

        let mut listener = TcpListener::bind(addr)?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;

        Ok(Server {
            poll,
            listener,
            connections: HashMap::new(),
            next_token: 1,
            store: Store::new(),
            config,
            last_purge: Instant::now(),
        })
    }

    /// The address the listener actually bound, useful with port 0
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Runs the accept/read/execute/write loop forever
    pub fn run(&mut self) -> Result<()> {
        let mut events = Events::with_capacity(self.config.max_clients.max(8));
        info!("listening on {}", self.local_addr()?);

        let purge_interval = Duration::from_millis(self.config.purge_interval_ms);
        loop {
            if self.last_purge.elapsed() >= purge_interval {
                purge_expired_keys(
                    &mut self.store.dict,
                    self.config.purge_sample_size,
                    self.config.purge_stop_ratio,
                );
                self.last_purge = Instant::now();
            }

            self.poll.poll(&mut events, None)?;

            for event in events.iter() {
                let token = event.token();
                if token == LISTENER {
                    self.accept_clients();
                } else {
                    self.handle_connection(token);
                }
            }
        }
    }

    /// Accepts until the listener would block, registering each connection
    /// for read readiness
    fn accept_clients(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((mut stream, peer)) => {
                    if self.connections.len() >= self.config.max_clients {
                        warn!("refusing connection from {peer}: client limit reached");
                        continue;
                    }

                    let token = Token(self.next_token);
                    self.next_token += 1;
                    if let Err(e) =
                        self.poll
                            .registry()
                            .register(&mut stream, token, Interest::READABLE)
                    {
                        error!("failed to register connection from {peer}: {e}");
                        continue;
                    }

                    debug!("accepted connection from {peer}");
                    self.connections.insert(token, stream);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    error!("accept failed: {e}");
                    break;
                }
            }
        }
    }

    /// Reads one command from a ready connection, executes it and replies
    fn handle_connection(&mut self, token: Token) {
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let Some(stream) = self.connections.get_mut(&token) else {
            return;
        };

        let n = match stream.read(&mut buf) {
            Ok(0) => {
                debug!("client disconnected");
                self.close(token);
                return;
            }
            Ok(n) => n,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return,
            Err(ref e) if e.kind() == io::ErrorKind::ConnectionReset => {
                debug!("client connection reset");
                self.close(token);
                return;
            }
            Err(e) => {
                warn!("read error: {e}");
                self.close(token);
                return;
            }
        };

        let reply = match Frame::decode(&buf[..n])
            .and_then(|(frame, _)| Command::from_frame(frame))
        {
            Ok(command) => {
                debug!("executing {}", command.name);
                self.store.execute(&command)
            }
            Err(e) => {
                debug!("discarding malformed request: {e}");
                Frame::Error(format!("ERR {e}"))
            }
        };

        let Some(stream) = self.connections.get_mut(&token) else {
            return;
        };
        if let Err(e) = stream.write_all(&reply.encode()) {
            warn!("write error: {e}");
            self.close(token);
        }
    }

    fn close(&mut self, token: Token) {
        if let Some(mut stream) = self.connections.remove(&token) {
            let _ = self.poll.registry().deregister(&mut stream);
        }
    }
}
