//! In-memory backend for exercising the session manager without libpcap

use std::collections::VecDeque;
use std::path::Path;

use tapline_core::{Error, NetMask, PacketMeta, Result};

use crate::backend::{CaptureBackend, CaptureSource, Frame};
use crate::capture::CaptureConfig;
use crate::filters::FilterProgram;
use crate::stats::CaptureCounters;

/// Outcome of one scripted poll
#[derive(Debug, Clone)]
pub enum ScriptedPoll {
    Packet(PacketMeta, Vec<u8>),
    Empty,
    Fail(String),
}

impl ScriptedPoll {
    /// A complete, untruncated capture of `data`
    pub fn packet(data: Vec<u8>) -> Self {
        let len = data.len() as u32;
        ScriptedPoll::Packet(
            PacketMeta {
                tv_sec: 1_600_000_000,
                tv_usec: 0,
                caplen: len,
                len,
            },
            data,
        )
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedSource {
    pub polls: VecDeque<ScriptedPoll>,
    pub current: Vec<u8>,
    pub config: Option<CaptureConfig>,
    pub nonblocking: bool,
    pub immediate_requested: bool,
    pub fail_immediate: bool,
    pub install_history: Vec<String>,
    pub installed: Option<String>,
    pub reject_install: bool,
    pub datalink: i32,
    pub fd: Option<i32>,
    pub stats_unsupported: bool,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self {
            polls: VecDeque::new(),
            current: Vec::new(),
            config: None,
            nonblocking: false,
            immediate_requested: false,
            fail_immediate: false,
            install_history: Vec::new(),
            installed: None,
            reject_install: false,
            datalink: 1,
            fd: None,
            stats_unsupported: false,
        }
    }
}

impl ScriptedSource {
    pub fn with_polls(polls: Vec<ScriptedPoll>) -> Self {
        Self {
            polls: polls.into(),
            ..Default::default()
        }
    }
}

fn is_valid_expression(expression: &str) -> bool {
    let trimmed = expression.trim_end();
    !trimmed.contains("!!!") && !trimmed.ends_with("port")
}

impl CaptureSource for ScriptedSource {
    fn compile_filter(&self, expression: &str, netmask: NetMask) -> Result<FilterProgram> {
        if !is_valid_expression(expression) {
            return Err(Error::FilterCompile(format!(
                "syntax error in filter expression: {}",
                expression
            )));
        }
        Ok(FilterProgram::new(expression, netmask, 1))
    }

    fn install_filter(&mut self, program: &FilterProgram) -> Result<()> {
        if self.reject_install {
            return Err(Error::FilterInstall(
                "filter does not match the link-layer type".to_string(),
            ));
        }
        self.install_history.push(program.expression().to_string());
        self.installed = Some(program.expression().to_string());
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame<'_>>> {
        match self.polls.pop_front() {
            Some(ScriptedPoll::Packet(meta, data)) => {
                self.current = data;
                Ok(Some(Frame {
                    meta,
                    data: &self.current,
                }))
            }
            Some(ScriptedPoll::Fail(reason)) => Err(Error::Dispatch(reason)),
            Some(ScriptedPoll::Empty) | None => Ok(None),
        }
    }

    fn datalink(&self) -> i32 {
        self.datalink
    }

    fn stats(&mut self) -> Result<CaptureCounters> {
        if self.stats_unsupported {
            return Err(Error::Stats(
                "Statistics aren't available from savefiles".to_string(),
            ));
        }
        Ok(CaptureCounters::default())
    }

    fn selectable_fd(&self) -> Option<i32> {
        self.fd
    }

    fn request_immediate_delivery(&mut self) -> std::io::Result<()> {
        self.immediate_requested = true;
        if self.fail_immediate {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "BIOCIMMEDIATE rejected",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    pub netmask: Option<NetMask>,
    pub fail_activate: bool,
    pub fail_nonblock: bool,
    pub template: ScriptedSource,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            netmask: Some(NetMask::new(0x0a00_0000, 0xff00_0000)),
            fail_activate: false,
            fail_nonblock: false,
            template: ScriptedSource::default(),
        }
    }
}

impl CaptureBackend for ScriptedBackend {
    type Source = ScriptedSource;

    fn lookup_net(&self, device: &str) -> Result<NetMask> {
        self.netmask
            .ok_or_else(|| Error::DeviceLookup(format!("{}: no IPv4 address assigned", device)))
    }

    fn activate_live(&self, device: &str, config: &CaptureConfig) -> Result<ScriptedSource> {
        if self.fail_activate {
            return Err(Error::Activation(format!(
                "{}: You don't have permission to capture on that device",
                device
            )));
        }
        Ok(ScriptedSource {
            config: Some(config.clone()),
            ..self.template.clone()
        })
    }

    fn open_offline(&self, path: &Path) -> Result<ScriptedSource> {
        if path.file_name().map_or(true, |name| name == "missing.pcap") {
            return Err(Error::file_open(
                path.display().to_string(),
                "No such file or directory",
            ));
        }
        Ok(ScriptedSource {
            stats_unsupported: true,
            ..self.template.clone()
        })
    }

    fn set_nonblocking(&self, mut source: ScriptedSource) -> Result<ScriptedSource> {
        if self.fail_nonblock {
            return Err(Error::NonBlockingMode("not supported".to_string()));
        }
        source.nonblocking = true;
        Ok(source)
    }

    fn version(&self) -> String {
        "scripted capture 0.0".to_string()
    }
}
