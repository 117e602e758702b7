//! Network device enumeration and address lookup

use std::net::{IpAddr, Ipv4Addr};

use ipnetwork::IpNetwork;
use tapline_core::{Error, NetMask, Result};

/// One IPv4 address bound to a capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    pub addr: Ipv4Addr,
    pub netmask: Option<Ipv4Addr>,
    pub broadaddr: Option<Ipv4Addr>,
    pub dstaddr: Option<Ipv4Addr>,
}

/// Information about a capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device name (e.g., "eth0", "en0")
    pub name: String,
    /// Human-readable description, when the platform has one
    pub description: Option<String>,
    /// IPv4 addresses; IPv6 addresses are not reported
    pub addresses: Vec<DeviceAddress>,
    /// Whether the device is a loopback
    pub is_loopback: bool,
}

fn ipv4(addr: Option<IpAddr>) -> Option<Ipv4Addr> {
    match addr {
        Some(IpAddr::V4(v4)) => Some(v4),
        _ => None,
    }
}

impl From<pcap::Device> for DeviceInfo {
    fn from(device: pcap::Device) -> Self {
        let addresses = device
            .addresses
            .iter()
            .filter_map(|address| match address.addr {
                IpAddr::V4(addr) => Some(DeviceAddress {
                    addr,
                    netmask: ipv4(address.netmask),
                    broadaddr: ipv4(address.broadcast_addr),
                    dstaddr: ipv4(address.dst_addr),
                }),
                IpAddr::V6(_) => None,
            })
            .collect();

        DeviceInfo {
            is_loopback: device.flags.is_loopback(),
            name: device.name,
            description: device.desc,
            addresses,
        }
    }
}

impl DeviceInfo {
    /// Whether this device makes a reasonable default for live capture
    pub fn is_default_candidate(&self) -> bool {
        !self.is_loopback && !self.addresses.is_empty()
    }

    /// First IPv4 address, if any
    pub fn primary_ipv4(&self) -> Option<Ipv4Addr> {
        self.addresses.first().map(|a| a.addr)
    }
}

/// List all capture devices known to libpcap
pub fn find_all_devices() -> Result<Vec<DeviceInfo>> {
    let devices = pcap::Device::list().map_err(|e| Error::DeviceLookup(e.to_string()))?;

    if devices.is_empty() {
        return Err(Error::DeviceLookup(
            "No capture devices found. Are you running with sufficient privileges?".to_string(),
        ));
    }

    Ok(devices.into_iter().map(DeviceInfo::from).collect())
}

/// First non-loopback device with an IPv4 address
pub fn pick_default(devices: &[DeviceInfo]) -> Option<&DeviceInfo> {
    devices.iter().find(|device| device.is_default_candidate())
}

/// Name of the device a live capture should use when none is given
pub fn default_device() -> Result<String> {
    let devices = find_all_devices()?;
    pick_default(&devices)
        .map(|device| device.name.clone())
        .ok_or(Error::NoDefaultDevice)
}

/// Network and mask of the first IPv4 network on `device`
pub fn lookup_net(device: &str) -> Result<NetMask> {
    let interfaces = pnet_datalink::interfaces();
    let iface = interfaces
        .iter()
        .find(|iface| iface.name == device)
        .ok_or_else(|| Error::DeviceLookup(format!("{}: no such device", device)))?;

    iface
        .ips
        .iter()
        .find_map(|network| match network {
            IpNetwork::V4(v4) => Some(NetMask::new(
                u32::from(v4.network()),
                u32::from(v4.mask()),
            )),
            IpNetwork::V6(_) => None,
        })
        .ok_or_else(|| Error::DeviceLookup(format!("{}: no IPv4 address assigned", device)))
}
