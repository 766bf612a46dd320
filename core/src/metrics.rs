use cadence::{BufferedUdpMetricSink, Counted, NopMetricSink, QueuingMetricSink, StatsdClient, Timed};
use clap::Parser;
use log::error;
use std::time::Duration;
use std::{net::UdpSocket, sync::Arc};

#[derive(Clone, Parser, Debug)]
pub struct MetricsArgs {
    #[arg(long, env, default_value = "127.0.0.1")]
    pub metrics_host: String,
    #[arg(long, env, default_value = "8125")]
    pub metrics_port: u16,
    #[arg(long, env, default_value = "hive.trx_fill")]
    pub metrics_prefix: String,
}

#[derive(thiserror::Error, Debug)]
pub enum MetricsError {
    #[error("udp socket: {0}")]
    Io(#[from] std::io::Error),
    #[error("metric sink: {0}")]
    Sink(#[from] cadence::MetricError),
}

#[derive(Clone, Debug)]
pub struct Metrics(Arc<StatsdClient>);

impl Metrics {
    pub fn try_from_config(config: &MetricsArgs) -> Result<Self, MetricsError> {
        let host = (config.metrics_host.as_str(), config.metrics_port);

        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;

        let udp_sink = BufferedUdpMetricSink::from(host, socket)?;
        let queuing_sink = QueuingMetricSink::from(udp_sink);
        let client = StatsdClient::from_sink(&config.metrics_prefix, queuing_sink);

        Ok(Metrics(Arc::new(client)))
    }

    /// A client that discards everything, for tests and dry runs.
    pub fn noop() -> Self {
        Metrics(Arc::new(StatsdClient::from_sink("", NopMetricSink)))
    }

    pub fn time(&self, key: &str, duration: Duration) {
        if let Err(e) = self.0.time(key, duration) {
            error!("submitting time: {:?}", e)
        }
    }

    pub fn increment(&self, key: &str) {
        self.count(key, 1);
    }

    pub fn count(&self, key: &str, value: i64) {
        if let Err(e) = self.0.count(key, value) {
            error!("submitting count: {:?}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_udp_client_without_a_listener() {
        let config = MetricsArgs {
            metrics_host: "127.0.0.1".to_string(),
            metrics_port: 8125,
            metrics_prefix: "hive.trx_fill.test".to_string(),
        };

        let metrics = Metrics::try_from_config(&config).unwrap();

        metrics.increment("block.succeeded");
        metrics.time("chunk.flushed", Duration::from_millis(3));
    }

    #[test]
    fn noop_clients_share_one_sink() {
        let metrics = Metrics::noop();
        let clone = metrics.clone();

        clone.count("rows.inserted", 1000);

        assert!(Arc::ptr_eq(&metrics.0, &clone.0));
    }
}
