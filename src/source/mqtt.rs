//! MQTT transport intake.
//!
//! Devices publish one combined report per sampling interval under
//! `smart-home/<room>/all`; the hub subscribes to the combined-report
//! filter at QoS 1. Delivery is at-least-once and unordered across topics -
//! duplicates reach the pipeline as distinct messages by design.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Broker connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Topic filter for combined device reports.
    pub topic: String,
    pub keep_alive_secs: u64,
    /// Capacity of the channel between the source and the pipeline.
    pub channel_capacity: usize,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "roomsense-hub".to_string(),
            topic: "smart-home/+/all".to_string(),
            keep_alive_secs: 60,
            channel_capacity: 256,
        }
    }
}

/// Delay before polling the event loop again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Spawn the MQTT source task.
///
/// Returns the receiving end of the payload channel (hand it to the
/// pipeline) and the task handle. The task ends when shutdown is signalled
/// or when the pipeline side of the channel closes.
pub fn spawn(
    settings: MqttSettings,
    shutdown: watch::Receiver<bool>,
) -> (mpsc::Receiver<Vec<u8>>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(settings.channel_capacity.max(1));
    let handle = tokio::spawn(run(settings, tx, shutdown));
    (rx, handle)
}

async fn run(settings: MqttSettings, tx: mpsc::Sender<Vec<u8>>, mut shutdown: watch::Receiver<bool>) {
    let mut options = MqttOptions::new(
        settings.client_id.clone(),
        settings.host.clone(),
        settings.port,
    );
    options.set_keep_alive(Duration::from_secs(settings.keep_alive_secs));

    let (client, mut eventloop) = AsyncClient::new(options, 16);

    loop {
        tokio::select! {
            res = shutdown.changed() => {
                if res.is_err() || *shutdown.borrow() {
                    let _ = client.disconnect().await;
                    debug!("mqtt source stopped");
                    return;
                }
            }
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!(
                        host = %settings.host,
                        port = settings.port,
                        topic = %settings.topic,
                        "connected to broker"
                    );
                    // Subscribe on every CONNACK: the subscription does not
                    // survive a reconnect.
                    if let Err(e) = client.subscribe(settings.topic.clone(), QoS::AtLeastOnce).await {
                        warn!(error = %e, "subscribe failed");
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if tx.send(publish.payload.to_vec()).await.is_err() {
                        debug!("pipeline inbound channel closed, stopping mqtt source");
                        return;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "mqtt connection error, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }
}
