//! End-to-end tests over a real TCP connection
//!
//! Each test boots a server on an ephemeral port in a background thread and
//! speaks RESP to it with a plain blocking socket, asserting replies by
//! their literal wire bytes.

use minnow_server::config::ServerConfig;
use minnow_server::server::Server;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

fn start_server() -> SocketAddr {
    let config = ServerConfig {
        port: 0,
        ..ServerConfig::default()
    };
    let mut server = Server::bind(config).expect("bind server");
    let addr = server.local_addr().expect("local addr");
    thread::spawn(move || {
        let _ = server.run();
    });
    addr
}

fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("read timeout");
    stream
}

/// Sends one command as a RESP array of bulk strings and returns the raw
/// reply bytes.
fn send(stream: &mut TcpStream, parts: &[&str]) -> Vec<u8> {
    let mut request = format!("*{}\r\n", parts.len()).into_bytes();
    for part in parts {
        request.extend_from_slice(format!("${}\r\n{}\r\n", part.len(), part).as_bytes());
    }
    stream.write_all(&request).expect("send command");

    let mut buf = [0u8; 4096];
    let n = stream.read(&mut buf).expect("read reply");
    buf[..n].to_vec()
}

#[test]
fn set_then_get_round_trip() {
    let addr = start_server();
    let mut client = connect(addr);

    assert_eq!(send(&mut client, &["SET", "foo", "bar"]), b"+OK\r\n");
    assert_eq!(send(&mut client, &["GET", "foo"]), b"$3\r\nbar\r\n");
}

#[test]
fn key_expires_after_its_deadline() {
    let addr = start_server();
    let mut client = connect(addr);

    assert_eq!(
        send(&mut client, &["SET", "foo", "bar", "EX", "1"]),
        b"+OK\r\n"
    );
    assert_eq!(send(&mut client, &["GET", "foo"]), b"$3\r\nbar\r\n");

    thread::sleep(Duration::from_millis(1200));

    assert_eq!(send(&mut client, &["GET", "foo"]), b"$-1\r\n");
    assert_eq!(send(&mut client, &["TTL", "foo"]), b":-2\r\n");
}

#[test]
fn ttl_without_deadline_is_minus_one() {
    let addr = start_server();
    let mut client = connect(addr);

    send(&mut client, &["SET", "foo", "bar"]);
    assert_eq!(send(&mut client, &["TTL", "foo"]), b":-1\r\n");
}

#[test]
fn set_commands_over_the_wire() {
    let addr = start_server();
    let mut client = connect(addr);

    assert_eq!(send(&mut client, &["SADD", "s", "a", "b", "a"]), b":2\r\n");
    assert_eq!(send(&mut client, &["SISMEMBER", "s", "a"]), b":1\r\n");
    assert_eq!(send(&mut client, &["SISMEMBER", "s", "c"]), b":0\r\n");
}

#[test]
fn sorted_set_commands_over_the_wire() {
    let addr = start_server();
    let mut client = connect(addr);

    assert_eq!(
        send(&mut client, &["ZADD", "z", "1", "a", "2", "b", "3", "c"]),
        b":3\r\n"
    );
    assert_eq!(send(&mut client, &["ZRANK", "z", "a"]), b":0\r\n");
    assert_eq!(send(&mut client, &["ZRANK", "z", "c"]), b":2\r\n");
    assert_eq!(
        send(&mut client, &["ZSCORE", "z", "b"]),
        b"$8\r\n2.000000\r\n"
    );

    assert_eq!(send(&mut client, &["ZADD", "z", "5", "b"]), b":1\r\n");
    assert_eq!(send(&mut client, &["ZRANK", "z", "b"]), b":2\r\n");
}

#[test]
fn unknown_command_gets_error_frame() {
    let addr = start_server();
    let mut client = connect(addr);

    assert_eq!(send(&mut client, &["NOSUCH"]), b"-command not found\r\n");
}

#[test]
fn malformed_request_keeps_connection_usable() {
    let addr = start_server();
    let mut client = connect(addr);

    client.write_all(b"!garbage\r\n").expect("send garbage");
    let mut buf = [0u8; 256];
    let n = client.read(&mut buf).expect("read reply");
    assert_eq!(buf[0], b'-');
    assert!(n > 1);

    assert_eq!(send(&mut client, &["PING"]), b"$4\r\nPONG\r\n");
}

#[test]
fn replies_come_back_in_request_order() {
    let addr = start_server();
    let mut client = connect(addr);

    for i in 0..20 {
        let value = format!("v{i}");
        assert_eq!(send(&mut client, &["SET", "k", &value]), b"+OK\r\n");
        let expected = format!("${}\r\n{}\r\n", value.len(), value).into_bytes();
        assert_eq!(send(&mut client, &["GET", "k"]), expected);
    }
}

#[test]
fn connections_are_independent() {
    let addr = start_server();
    let mut first = connect(addr);
    let mut second = connect(addr);

    assert_eq!(send(&mut first, &["SET", "shared", "x"]), b"+OK\r\n");
    assert_eq!(send(&mut second, &["GET", "shared"]), b"$1\r\nx\r\n");

    drop(first);
    assert_eq!(send(&mut second, &["PING"]), b"$4\r\nPONG\r\n");
}
