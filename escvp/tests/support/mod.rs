//! Loopback stand-ins for a projector

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use escvp::{DiscoveryConfig, Frame, FrameType, Status};

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Discovery settings aimed at a responder on loopback
pub fn loopback_discovery(port: u16) -> DiscoveryConfig {
    DiscoveryConfig::default()
        .with_port(port)
        .with_listen_port(0)
        .with_broadcast(LOCALHOST)
        .with_interval(Duration::from_millis(200))
        .with_retries(5)
}

/// Answers every HELLO request on `socket` with HELLO/OK
pub fn spawn_hello_responder(socket: UdpSocket) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        loop {
            let Ok((n, from)) = socket.recv_from(&mut buf).await else {
                return;
            };
            let Some(frame) = Frame::decode(&buf[..n]) else {
                continue;
            };
            if frame.frame_type == FrameType::Hello && frame.status == Status::Request {
                let reply = Frame::new(FrameType::Hello, Status::Ok).encode();
                socket.send_to(&reply, from).await.ok();
            }
        }
    })
}

/// Counts datagrams that arrive on `socket` within `quiet` of each other
pub async fn drain_count(socket: &UdpSocket, quiet: Duration) -> usize {
    let mut buf = [0u8; 512];
    let mut count = 0;
    while let Ok(Ok(_)) = timeout(quiet, socket.recv_from(&mut buf)).await {
        count += 1;
    }
    count
}

/// How the fake projector handles one connection
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Acknowledge the handshake, then answer with these bytes
    Reply(&'static [u8]),
    /// Same as `Reply`, but every write is split into small pieces
    Fragmented(&'static [u8]),
    /// Read the handshake and hang up
    CloseBeforeAck,
    /// Acknowledge, read the command and hang up
    CloseBeforeReply,
    /// Read the handshake and never answer
    Silent,
}

/// TCP side of a fake projector
pub struct FakeProjector {
    pub port: u16,
    pub commands: Arc<Mutex<Vec<String>>>,
    pub task: JoinHandle<()>,
}

impl FakeProjector {
    pub async fn start(behaviors: Vec<Behavior>) -> Self {
        let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        Self::serve(listener, behaviors)
    }

    pub fn serve(listener: TcpListener, behaviors: Vec<Behavior>) -> Self {
        let port = listener.local_addr().unwrap().port();
        let commands = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&commands);
        let task = tokio::spawn(async move {
            for behavior in behaviors {
                let (socket, _) = listener.accept().await.unwrap();
                handle(socket, behavior, &log).await;
            }
        });

        Self {
            port,
            commands,
            task,
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(LOCALHOST, self.port)
    }
}

async fn handle(mut socket: TcpStream, behavior: Behavior, log: &Mutex<Vec<String>>) {
    let mut handshake = [0u8; Frame::BASE_SIZE];
    socket.read_exact(&mut handshake).await.unwrap();
    let frame = Frame::decode(&handshake).expect("handshake is a frame");
    assert_eq!(frame.frame_type, FrameType::Connect);
    assert_eq!(frame.status, Status::Request);

    let ack = Frame::new(FrameType::Connect, Status::Ok).encode();
    match behavior {
        Behavior::CloseBeforeAck => return,
        Behavior::Silent => {
            sleep(Duration::from_secs(5)).await;
            return;
        }
        Behavior::Fragmented(_) => write_in_pieces(&mut socket, &ack).await,
        Behavior::Reply(_) | Behavior::CloseBeforeReply => socket.write_all(&ack).await.unwrap(),
    }

    let command = read_line(&mut socket).await;
    log.lock().unwrap().push(command);

    match behavior {
        Behavior::Reply(reply) => socket.write_all(reply).await.unwrap(),
        Behavior::Fragmented(reply) => write_in_pieces(&mut socket, reply).await,
        _ => {}
    }
}

async fn read_line(socket: &mut TcpStream) -> String {
    let mut line = Vec::new();
    loop {
        let byte = socket.read_u8().await.unwrap();
        if byte == b'\r' {
            return String::from_utf8(line).unwrap();
        }
        line.push(byte);
    }
}

async fn write_in_pieces(socket: &mut TcpStream, data: &[u8]) {
    for piece in data.chunks(3) {
        socket.write_all(piece).await.unwrap();
        socket.flush().await.unwrap();
        sleep(Duration::from_millis(20)).await;
    }
}
