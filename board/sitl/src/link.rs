use std::{
    io::ErrorKind,
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
    sync::{mpsc, Arc, PoisonError, RwLock},
    thread::JoinHandle,
    time::{Duration, Instant},
};

use anyhow::Context;
use log::{debug, info, warn};

use crate::config::LinkConfig;
use crate::packet::{Datagram, MotorPacket, Telemetry};

// Socket reads wake up this often to check for a stop command
const READ_TIMEOUT: Duration = Duration::from_millis(20);
const MAX_DATAGRAM: usize = 1024;

pub enum LinkCommand {
    Stop,
}

#[derive(Debug)]
struct Inbox<T> {
    latest: Option<T>,
    received: u64,
    rejected: u64,
}

#[derive(Debug)]
struct Outbox<T> {
    latest: Option<T>,
    fresh: bool,
    sent: u64,
}

fn resolve(addr: impl ToSocketAddrs) -> anyhow::Result<SocketAddr> {
    addr.to_socket_addrs()?
        .next()
        .context("Address resolved to nothing")
}

fn send_stop(tx: &mut Option<mpsc::Sender<LinkCommand>>, worker: &mut Option<JoinHandle<()>>) {
    if let Some(tx) = tx.take() {
        let _ = tx.send(LinkCommand::Stop);
    }
    if let Some(handle) = worker.take() {
        if handle.join().is_err() {
            warn!("Link worker panicked");
        }
    }
}

/// Receives datagrams on a worker thread and keeps the most recent valid one
pub struct DatagramListener<T: Datagram> {
    inbox: Arc<RwLock<Inbox<T>>>,
    local_addr: SocketAddr,
    to_worker_tx: Option<mpsc::Sender<LinkCommand>>,
    worker_thread: Option<JoinHandle<()>>,
}

impl<T: Datagram> DatagramListener<T> {
    pub fn bind(addr: impl ToSocketAddrs) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(addr).context("Failed to bind listener socket")?;
        socket.set_read_timeout(Some(READ_TIMEOUT))?;
        let local_addr = socket.local_addr()?;

        let inbox = Arc::new(RwLock::new(Inbox {
            latest: None,
            received: 0,
            rejected: 0,
        }));
        let (to_worker_tx, to_worker_rx) = mpsc::channel();
        let worker_thread = Self::run(socket, inbox.clone(), to_worker_rx);
        info!("Listening on {local_addr}");

        Ok(Self {
            inbox,
            local_addr,
            to_worker_tx: Some(to_worker_tx),
            worker_thread: Some(worker_thread),
        })
    }

    fn run(
        socket: UdpSocket,
        inbox: Arc<RwLock<Inbox<T>>>,
        to_worker_rx: mpsc::Receiver<LinkCommand>,
    ) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let mut buffer = [0u8; MAX_DATAGRAM];
            loop {
                match to_worker_rx.try_recv() {
                    Ok(LinkCommand::Stop) | Err(mpsc::TryRecvError::Disconnected) => return,
                    Err(mpsc::TryRecvError::Empty) => {}
                }

                let (len, from) = match socket.recv_from(&mut buffer) {
                    Ok(received) => received,
                    Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
                    Err(e) => {
                        warn!("Receive failed: {e}");
                        std::thread::sleep(READ_TIMEOUT);
                        continue;
                    }
                };

                let decoded = T::decode(&buffer[..len]);
                let mut inbox = inbox.write().unwrap_or_else(PoisonError::into_inner);
                match decoded {
                    Ok(value) => {
                        inbox.latest = Some(value);
                        inbox.received += 1;
                    }
                    Err(e) => {
                        debug!("Dropped datagram from {from}: {e}");
                        inbox.rejected += 1;
                    }
                }
            }
        })
    }

    /// Most recent valid datagram, `None` before the first one arrives
    pub fn latest(&self) -> Option<T> {
        self.inbox.read().unwrap_or_else(PoisonError::into_inner).latest.clone()
    }

    pub fn received(&self) -> u64 {
        self.inbox.read().unwrap_or_else(PoisonError::into_inner).received
    }

    pub fn rejected(&self) -> u64 {
        self.inbox.read().unwrap_or_else(PoisonError::into_inner).rejected
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stop(&mut self) {
        send_stop(&mut self.to_worker_tx, &mut self.worker_thread);
    }
}

impl<T: Datagram> Drop for DatagramListener<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sends the most recently published value from a worker thread.
///
/// The worker wakes once per period and sends only if something new was
/// published since its last send, so a slow link drops stale values.
pub struct DatagramEmitter<T: Datagram> {
    outbox: Arc<RwLock<Outbox<T>>>,
    target: SocketAddr,
    to_worker_tx: Option<mpsc::Sender<LinkCommand>>,
    worker_thread: Option<JoinHandle<()>>,
}

impl<T: Datagram> DatagramEmitter<T> {
    pub fn connect(target: impl ToSocketAddrs, period: Duration) -> anyhow::Result<Self> {
        let target = resolve(target).context("Failed to resolve emitter target")?;
        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local).context("Failed to bind emitter socket")?;

        let outbox = Arc::new(RwLock::new(Outbox {
            latest: None,
            fresh: false,
            sent: 0,
        }));
        let (to_worker_tx, to_worker_rx) = mpsc::channel();
        let worker_thread = Self::run(socket, target, period, outbox.clone(), to_worker_rx);
        info!("Sending to {target}");

        Ok(Self {
            outbox,
            target,
            to_worker_tx: Some(to_worker_tx),
            worker_thread: Some(worker_thread),
        })
    }

    fn run(
        socket: UdpSocket,
        target: SocketAddr,
        period: Duration,
        outbox: Arc<RwLock<Outbox<T>>>,
        to_worker_rx: mpsc::Receiver<LinkCommand>,
    ) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let mut last_loop_time = Instant::now();
            loop {
                match to_worker_rx.try_recv() {
                    Ok(LinkCommand::Stop) | Err(mpsc::TryRecvError::Disconnected) => return,
                    Err(mpsc::TryRecvError::Empty) => {}
                }

                let now = Instant::now();
                let elapsed = now.duration_since(last_loop_time);
                if elapsed < period {
                    std::thread::sleep(period - elapsed);
                    continue;
                }
                last_loop_time = now;

                let pending = {
                    let mut outbox = outbox.write().unwrap_or_else(PoisonError::into_inner);
                    if outbox.fresh {
                        outbox.fresh = false;
                        outbox.latest.clone()
                    } else {
                        None
                    }
                };

                if let Some(value) = pending {
                    match socket.send_to(&value.encode(), target) {
                        Ok(_) => outbox.write().unwrap_or_else(PoisonError::into_inner).sent += 1,
                        Err(e) => debug!("Send to {target} failed: {e}"),
                    }
                }
            }
        })
    }

    /// Replace the value the worker sends next
    pub fn publish(&self, value: T) {
        let mut outbox = self.outbox.write().unwrap_or_else(PoisonError::into_inner);
        outbox.latest = Some(value);
        outbox.fresh = true;
    }

    pub fn sent(&self) -> u64 {
        self.outbox.read().unwrap_or_else(PoisonError::into_inner).sent
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn stop(&mut self) {
        send_stop(&mut self.to_worker_tx, &mut self.worker_thread);
    }
}

impl<T: Datagram> Drop for DatagramEmitter<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Dynamics side of the proxy: takes motor commands, sends telemetry
pub struct DynamicsLink<const N: usize> {
    motors: DatagramListener<MotorPacket<N>>,
    telemetry: DatagramEmitter<Telemetry>,
}

impl<const N: usize> DynamicsLink<N> {
    pub fn new(motors: DatagramListener<MotorPacket<N>>, telemetry: DatagramEmitter<Telemetry>) -> Self {
        DynamicsLink { motors, telemetry }
    }

    /// Listen for motors on all interfaces and send telemetry to the configured host
    pub fn bind(config: &LinkConfig) -> anyhow::Result<Self> {
        let motors = DatagramListener::bind(("0.0.0.0", config.motor_port))
            .with_context(|| format!("Motor port {}", config.motor_port))?;
        let telemetry = DatagramEmitter::connect((config.host.as_str(), config.telemetry_port), config.period())
            .with_context(|| format!("Telemetry target {}:{}", config.host, config.telemetry_port))?;
        Ok(Self::new(motors, telemetry))
    }

    /// Latest motor command, `None` until the controller has sent one
    pub fn latest_motors(&self) -> Option<[f64; N]> {
        self.motors.latest().map(|packet| packet.motors)
    }

    pub fn publish(&self, telemetry: Telemetry) {
        self.telemetry.publish(telemetry);
    }

    pub fn motor_listener(&self) -> &DatagramListener<MotorPacket<N>> {
        &self.motors
    }

    pub fn stop(&mut self) {
        self.motors.stop();
        self.telemetry.stop();
    }
}

/// Controller side of the proxy: sends motor commands, takes telemetry
pub struct ControllerLink<const N: usize> {
    motors: DatagramEmitter<MotorPacket<N>>,
    telemetry: DatagramListener<Telemetry>,
}

impl<const N: usize> ControllerLink<N> {
    pub fn new(motors: DatagramEmitter<MotorPacket<N>>, telemetry: DatagramListener<Telemetry>) -> Self {
        ControllerLink { motors, telemetry }
    }

    pub fn connect(config: &LinkConfig) -> anyhow::Result<Self> {
        let telemetry = DatagramListener::bind(("0.0.0.0", config.telemetry_port))
            .with_context(|| format!("Telemetry port {}", config.telemetry_port))?;
        let motors = DatagramEmitter::connect((config.host.as_str(), config.motor_port), config.period())
            .with_context(|| format!("Motor target {}:{}", config.host, config.motor_port))?;
        Ok(Self::new(motors, telemetry))
    }

    pub fn send_motors(&self, motors: [f64; N]) {
        self.motors.publish(MotorPacket::new(motors));
    }

    pub fn latest_telemetry(&self) -> Option<Telemetry> {
        self.telemetry.latest()
    }

    pub fn telemetry_listener(&self) -> &DatagramListener<Telemetry> {
        &self.telemetry
    }

    pub fn stop(&mut self) {
        self.motors.stop();
        self.telemetry.stop();
    }
}
