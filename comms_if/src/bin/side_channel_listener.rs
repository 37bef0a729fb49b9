//! Side-channel listener
//!
//! Stands in for the relay and camera servers on the vehicle. Binds both ports and prints every
//! command received, so the executable can be exercised on the bench.
//!
//! Usage: `side_channel_listener [relay_port] [camera_port]`

use comms_if::eqpt::{cam, relay::RelayCmd};
use std::{
    io::Read,
    net::{TcpListener, TcpStream},
    thread,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    let relay_port: u16 = args.get(1).map(|s| s.parse()).transpose()?.unwrap_or(60000);
    let camera_port: u16 = args.get(2).map(|s| s.parse()).transpose()?.unwrap_or(5000);

    let relay_listener = TcpListener::bind(("0.0.0.0", relay_port))?;
    let camera_listener = TcpListener::bind(("0.0.0.0", camera_port))?;

    println!("Relay server running on port {}", relay_port);
    println!("Camera server running on port {}", camera_port);

    let relay_thread = thread::spawn(move || serve(relay_listener, handle_relay));
    let camera_thread = thread::spawn(move || serve(camera_listener, handle_camera));

    relay_thread.join().ok();
    camera_thread.join().ok();

    Ok(())
}

/// Accept connections forever, reading each to EOF and handing the bytes to `handler`.
fn serve(listener: TcpListener, handler: fn(&[u8])) {
    for stream in listener.incoming() {
        match stream.and_then(read_all) {
            Ok(buf) => handler(&buf),
            Err(e) => println!("Connection error: {}", e)
        }
    }
}

fn read_all(mut stream: TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf)?;
    Ok(buf)
}

fn handle_relay(buf: &[u8]) {
    match RelayCmd::from_bytes(buf) {
        Some(cmd) => println!("Relay {:?} -> {}", cmd.relay, cmd.enabled),
        None => println!("Invalid relay payload: {:?}", buf)
    }
}

fn handle_camera(buf: &[u8]) {
    match std::str::from_utf8(buf).map(cam::from_line) {
        Ok(Ok(states)) => println!("Cameras -> {:?}", states),
        Ok(Err(e)) => println!("Invalid camera payload: {}", e),
        Err(_) => println!("Camera payload is not UTF-8")
    }
}
