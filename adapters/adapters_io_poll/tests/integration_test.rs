//! Integration tests for adapters_io_poll crate
//!
//! Drives a real non-blocking TCP connection through `PollDesc` the way an
//! adopted endpoint does.

use adapters_io_poll::*;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::os::fd::AsFd;
use std::thread;
use std::time::Duration;

#[test]
fn test_blocking_style_round_trip_over_nonblocking_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_millis(50));
        stream.write_all(b"hello").unwrap();
        let mut reply = [0u8; 11];
        stream.read_exact(&mut reply).unwrap();
        reply
    });

    let stream = TcpStream::connect(addr).unwrap();
    stream.set_nonblocking(true).unwrap();
    let pd = PollDesc::init(stream.as_fd(), PollConfig::default()).unwrap();

    let mut buf = [0u8; 5];
    let mut filled = 0;
    while filled < buf.len() {
        let n = pd
            .run(stream.as_fd(), Interest::Read, || (&stream).read(&mut buf[filled..]))
            .unwrap();
        assert!(n > 0, "peer closed early");
        filled += n;
    }
    assert_eq!(&buf, b"hello");

    let n = pd
        .run(stream.as_fd(), Interest::Write, || (&stream).write(b"hello world"))
        .unwrap();
    assert_eq!(n, 11);

    assert_eq!(&peer.join().unwrap(), b"hello world");
}

#[test]
fn test_poll_error_converts_to_io_error() {
    let err: io::Error = IoPollError::InvalidFd(-1).into();
    // EBADF
    assert_eq!(err.raw_os_error(), Some(9));
}
