use bpview_protocol::WireMessage;
use tokio::sync::mpsc;

/// One end of an ordered, unbounded message channel between two contexts.
///
/// Messages arrive in the order they were sent. A port is `Send`, so one end
/// can be moved into a worker thread before its endpoint is built there.
#[derive(Debug)]
pub struct Port {
    pub(crate) tx: mpsc::UnboundedSender<WireMessage>,
    pub(crate) rx: mpsc::UnboundedReceiver<WireMessage>,
}

/// Create two connected ports.
pub fn port_pair() -> (Port, Port) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (Port { tx: a_tx, rx: a_rx }, Port { tx: b_tx, rx: b_rx })
}

#[cfg(test)]
mod tests {
    use bpview_protocol::ProxyId;

    use super::*;

    #[test]
    fn ports_are_crossed() {
        let (mut a, mut b) = port_pair();
        a.tx.send(WireMessage::Release { target: ProxyId(1) }).unwrap();
        b.tx.send(WireMessage::Release { target: ProxyId(2) }).unwrap();
        assert_eq!(
            b.rx.try_recv().unwrap(),
            WireMessage::Release { target: ProxyId(1) }
        );
        assert_eq!(
            a.rx.try_recv().unwrap(),
            WireMessage::Release { target: ProxyId(2) }
        );
    }
}
