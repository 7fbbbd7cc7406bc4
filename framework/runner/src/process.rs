use sysinfo::{Pid, ProcessesToUpdate, System};

pub type ProcessId = u32;

/// Finding and force-terminating engine processes by name.
///
/// Every operation tolerates targets that have already exited: terminating or awaiting a process
/// that is gone is not an error.
pub trait ProcessControl {
    /// Ids of every running process whose executable name matches `name`.
    fn list_by_name(&mut self, name: &str) -> Vec<ProcessId>;

    /// Forcibly terminate `pid`. Returns `false` if it was no longer running.
    fn terminate(&mut self, pid: ProcessId) -> bool;

    /// Block until `pid` has exited.
    fn await_exit(&mut self, pid: ProcessId);
}

/// [`ProcessControl`] over the OS process table.
#[derive(Debug)]
pub struct SysinfoProcessControl {
    system: System,
}

impl Default for SysinfoProcessControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProcessControl {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl ProcessControl for SysinfoProcessControl {
    fn list_by_name(&mut self, name: &str) -> Vec<ProcessId> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);

        let own_pid = std::process::id();
        self.system
            .processes()
            .values()
            // Linux also reports every task of a process, only whole processes can be killed
            .filter(|process| process.thread_kind().is_none())
            .filter(|process| matches_process_name(&process.name().to_string_lossy(), name))
            .map(|process| process.pid().as_u32())
            .filter(|pid| *pid != own_pid)
            .collect()
    }

    fn terminate(&mut self, pid: ProcessId) -> bool {
        match self.system.process(Pid::from_u32(pid)) {
            Some(process) => process.kill(),
            None => false,
        }
    }

    fn await_exit(&mut self, pid: ProcessId) {
        if let Some(process) = self.system.process(Pid::from_u32(pid)) {
            let _ = process.wait();
        }
    }
}

/// Compare process names the way the Windows process APIs do: case-insensitive and without
/// caring whether either side carries the `.exe` extension.
pub(crate) fn matches_process_name(process_name: &str, wanted: &str) -> bool {
    strip_exe(process_name).eq_ignore_ascii_case(strip_exe(wanted))
}

fn strip_exe(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
        &name[..len - 4]
    } else {
        name
    }
}
