//! BPF (Berkeley Packet Filter) compilation and installation

use tapline_core::{NetMask, Result};
use tracing::debug;

use crate::backend::CaptureSource;

/// Optimizer flag passed to the filter compiler
pub const OPTIMIZE: bool = true;

/// A filter expression compiled for one capture context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterProgram {
    expression: String,
    netmask: NetMask,
    instructions: usize,
}

impl FilterProgram {
    pub fn new(expression: impl Into<String>, netmask: NetMask, instructions: usize) -> Self {
        Self {
            expression: expression.into(),
            netmask,
            instructions,
        }
    }

    /// Source text of the filter
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Network context the program was compiled against
    pub fn netmask(&self) -> NetMask {
        self.netmask
    }

    /// Number of BPF instructions in the compiled program
    pub fn instruction_count(&self) -> usize {
        self.instructions
    }

    /// Whether the program accepts every packet
    pub fn matches_everything(&self) -> bool {
        self.expression.trim().is_empty()
    }
}

/// Compile `expression` on `source`
///
/// An empty expression still goes through the compiler and yields a
/// match-all program.
pub fn compile<S: CaptureSource + ?Sized>(
    source: &S,
    expression: &str,
    netmask: NetMask,
) -> Result<FilterProgram> {
    debug!(
        filter = expression,
        network = netmask.network,
        mask = netmask.mask,
        "Compiling BPF filter"
    );
    let program = source.compile_filter(expression, netmask)?;
    debug!(
        instructions = program.instruction_count(),
        "BPF filter compiled"
    );
    Ok(program)
}

/// Attach `program` to `source`, replacing the previous filter
pub fn install<S: CaptureSource + ?Sized>(source: &mut S, program: &FilterProgram) -> Result<()> {
    source.install_filter(program)?;
    debug!(filter = program.expression(), "BPF filter installed");
    Ok(())
}

/// Compile and install in one step
pub fn apply<S: CaptureSource + ?Sized>(
    source: &mut S,
    expression: &str,
    netmask: NetMask,
) -> Result<FilterProgram> {
    let program = compile(source, expression, netmask)?;
    install(source, &program)?;
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSource;
    use tapline_core::Error;

    #[test]
    fn test_empty_filter_is_compiled() {
        let mut source = ScriptedSource::default();
        let program = apply(&mut source, "", NetMask::UNKNOWN).unwrap();
        assert!(program.matches_everything());
        assert_eq!(source.install_history, vec![String::new()]);
        assert_eq!(source.installed.as_deref(), Some(""));
    }

    #[test]
    fn test_compile_error_is_reported() {
        let source = ScriptedSource::default();
        match compile(&source, "invalid filter syntax !!!", NetMask::UNKNOWN) {
            Err(Error::FilterCompile(msg)) => assert!(msg.contains("syntax error")),
            other => panic!("Expected FilterCompile, got {:?}", other),
        }
    }

    #[test]
    fn test_install_error_is_reported() {
        let mut source = ScriptedSource {
            reject_install: true,
            ..Default::default()
        };
        let program = compile(&source, "arp", NetMask::UNKNOWN).unwrap();
        match install(&mut source, &program) {
            Err(Error::FilterInstall(_)) => {}
            other => panic!("Expected FilterInstall, got {:?}", other),
        }
        assert!(source.installed.is_none());
    }

    #[test]
    fn test_program_keeps_netmask() {
        let source = ScriptedSource::default();
        let netmask = NetMask::new(0x0a00_0000, 0xff00_0000);
        let program = compile(&source, "ip broadcast", netmask).unwrap();
        assert_eq!(program.netmask(), netmask);
        assert_eq!(program.expression(), "ip broadcast");
        assert!(!program.matches_everything());
    }
}
