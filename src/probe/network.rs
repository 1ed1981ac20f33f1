use std::net::{IpAddr, UdpSocket};

/// One way a mobile client can reach the service.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointHint {
    pub target: &'static str,
    pub url: Option<String>,
    pub note: &'static str,
}

/// Primary outbound IPv4 address of this machine. Connecting a UDP socket
/// sends no packets; it only makes the OS pick a route.
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    socket
        .local_addr()
        .ok()
        .map(|addr| addr.ip())
        .filter(|ip| !ip.is_unspecified())
}

pub fn endpoint_hints(port: u16, lan_ip: Option<IpAddr>) -> Vec<EndpointHint> {
    vec![
        EndpointHint {
            target: "Android emulator",
            url: Some(predict_url("10.0.2.2", port)),
            note: "10.0.2.2 is the emulator's alias for the host machine",
        },
        EndpointHint {
            target: "Physical device (same Wi-Fi)",
            url: lan_ip.map(|ip| predict_url(&ip.to_string(), port)),
            note: "device and computer must share a network and the port must be open",
        },
        EndpointHint {
            target: "iOS simulator",
            url: Some(predict_url("127.0.0.1", port)),
            note: "the simulator reaches localhost directly",
        },
    ]
}

fn predict_url(host: &str, port: u16) -> String {
    format!("http://{}:{}/predict", host, port)
}
