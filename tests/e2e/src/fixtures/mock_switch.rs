//! Mock OpenFlow switch for testing
//!
//! Connects to the checker like a real switch would, answers the handshake
//! and a small set of requests, and records every flow mod it receives so
//! flow stats requests can be answered from its "table".

use anyhow::{bail, Context, Result};
use bytes::BytesMut;
use codec::FrameCodec;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};
use types::{
    Body, FlowMod, FlowStats, Message, MultipartReply, MultipartRequestBody, SwitchFeatures,
    OFP_VERSION,
};

/// Echo request with payload "ka"
const ECHO_REQUEST: [u8; 10] = [0x04, 0x02, 0x00, 0x0a, 0, 0, 0, 0, b'k', b'a'];

/// Packet-in with a two-byte body; the default codec registry has no entry for it
pub const PACKET_IN: [u8; 10] = [0x04, 0x0a, 0x00, 0x0a, 0, 0, 0, 0, 0xab, 0xcd];

#[derive(Clone)]
pub struct MockSwitchConfig {
    pub dpid: u64,
    pub version: u8,
    pub n_buffers: u32,
    pub n_tables: u8,
    pub auxiliary_id: u8,
    pub capabilities: u32,
    /// Reported as `duration_sec` of every flow stats entry
    pub flow_duration_sec: u32,
    /// Raw frames sent unsolicited ahead of each barrier or multipart reply
    pub chatter: Vec<Vec<u8>>,
    /// Stop answering anything once the handshake is done
    pub silent: bool,
    /// Connect over TLS with this client configuration
    pub tls: Option<Arc<rustls::ClientConfig>>,
}

impl MockSwitchConfig {
    pub fn new(dpid: u64) -> Self {
        Self {
            dpid,
            version: OFP_VERSION,
            n_buffers: 65535,
            n_tables: 255,
            auxiliary_id: 0,
            capabilities: 0x4f,
            flow_duration_sec: 0,
            chatter: Vec::new(),
            silent: false,
            tls: None,
        }
    }

    /// Interleave an echo request with replies
    pub fn with_chatter(mut self) -> Self {
        self.chatter.push(ECHO_REQUEST.to_vec());
        self
    }

    /// Interleave a packet-in with replies
    pub fn with_packet_in(mut self) -> Self {
        self.chatter.push(PACKET_IN.to_vec());
        self
    }

    pub fn with_tls(mut self, client: Arc<rustls::ClientConfig>) -> Self {
        self.tls = Some(client);
        self
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    pub fn with_flow_duration(mut self, secs: u32) -> Self {
        self.flow_duration_sec = secs;
        self
    }
}

pub struct MockSwitch {
    config: MockSwitchConfig,
    flows: Arc<Mutex<Vec<FlowMod>>>,
    task: JoinHandle<Result<()>>,
}

impl MockSwitch {
    /// Connect to `controller` and serve in a background task
    pub fn connect(controller: SocketAddr, config: MockSwitchConfig) -> Self {
        let flows = Arc::new(Mutex::new(Vec::new()));
        let task = {
            let config = config.clone();
            let flows = flows.clone();
            tokio::spawn(async move { Self::run(controller, config, flows).await })
        };
        Self {
            config,
            flows,
            task,
        }
    }

    pub fn dpid(&self) -> u64 {
        self.config.dpid
    }

    /// Flow mods received so far
    pub fn flows(&self) -> Vec<FlowMod> {
        self.flows.lock().clone()
    }

    /// Wait for the switch to finish (the checker closed the connection)
    pub async fn join(self) -> Result<()> {
        self.task.await.context("mock switch task panicked")?
    }

    async fn run(
        controller: SocketAddr,
        config: MockSwitchConfig,
        flows: Arc<Mutex<Vec<FlowMod>>>,
    ) -> Result<()> {
        let stream = TcpStream::connect(controller)
            .await
            .with_context(|| format!("mock switch failed to connect to {}", controller))?;
        info!(dpid = config.dpid, %controller, tls = config.tls.is_some(), "Mock switch connected");

        match config.tls.clone() {
            Some(client) => {
                let name = rustls::ServerName::try_from("localhost").context("invalid server name")?;
                let stream = TlsConnector::from(client)
                    .connect(name, stream)
                    .await
                    .context("TLS handshake with controller failed")?;
                Self::serve(stream, config, flows).await
            }
            None => Self::serve(stream, config, flows).await,
        }
    }

    async fn serve<S>(
        mut stream: S,
        config: MockSwitchConfig,
        flows: Arc<Mutex<Vec<FlowMod>>>,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let codec = FrameCodec::default();
        let mut buffer = BytesMut::new();
        let mut identified = false;

        send(&codec, &mut stream, Message::hello().with_version(config.version).with_xid(0)).await?;

        loop {
            let msg = match codec.read_message(&mut stream, &mut buffer).await {
                Ok(msg) => msg,
                Err(codec::FrameReadError::Closed { .. }) => {
                    debug!(dpid = config.dpid, "Controller closed the connection");
                    return Ok(());
                }
                Err(e) => bail!("mock switch read failed: {}", e),
            };
            let xid = msg.xid.unwrap_or_default();
            if identified && config.silent {
                debug!(dpid = config.dpid, kind = %msg.kind(), "Ignoring message");
                continue;
            }

            let reply = match msg.body {
                Body::Hello(_) => None,
                Body::FeaturesRequest => {
                    identified = true;
                    Some(Body::FeaturesReply(SwitchFeatures {
                        datapath_id: config.dpid,
                        n_buffers: config.n_buffers,
                        n_tables: config.n_tables,
                        auxiliary_id: config.auxiliary_id,
                        capabilities: config.capabilities,
                        reserved: 0,
                    }))
                }
                Body::EchoRequest(echo) => Some(Body::EchoReply(echo)),
                Body::FlowMod(flow_mod) => {
                    flows.lock().push(flow_mod);
                    None
                }
                Body::BarrierRequest => Some(Body::BarrierReply),
                Body::MultipartRequest(request) => match request.body {
                    MultipartRequestBody::Flow(_) => {
                        let entries = flows
                            .lock()
                            .iter()
                            .map(|flow_mod| flow_stats(flow_mod, config.flow_duration_sec))
                            .collect();
                        Some(Body::MultipartReply(MultipartReply::flow(entries)))
                    }
                    MultipartRequestBody::Opaque(_) => None,
                },
                _ => None,
            };

            if let Some(body) = reply {
                let chatty = matches!(body, Body::BarrierReply | Body::MultipartReply(_));
                if chatty {
                    for frame in &config.chatter {
                        stream.write_all(frame).await?;
                    }
                }
                let reply = Message::new(body).with_version(config.version).with_xid(xid);
                send(&codec, &mut stream, reply).await?;
            }
        }
    }
}

async fn send<S>(codec: &FrameCodec, stream: &mut S, msg: Message) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let frame = codec.encode(&msg)?;
    stream.write_all(&frame).await?;
    stream.flush().await?;
    Ok(())
}

/// Table entry as a switch reports it after installing `flow_mod`
fn flow_stats(flow_mod: &FlowMod, duration_sec: u32) -> FlowStats {
    FlowStats {
        table_id: flow_mod.table_id,
        duration_sec,
        priority: flow_mod.priority,
        idle_timeout: flow_mod.idle_timeout,
        hard_timeout: flow_mod.hard_timeout,
        flags: flow_mod.flags,
        cookie: flow_mod.cookie,
        match_: flow_mod.match_.clone(),
        instructions: flow_mod.instructions.clone(),
        ..FlowStats::default()
    }
}
