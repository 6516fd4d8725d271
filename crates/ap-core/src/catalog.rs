//! The shipped plugins, wired to live or simulated sources.

use crate::action::{ActionExecutor, EmailNotification, ShellCommand};
use crate::host::HostInfo;
use crate::runtime::PluginHandle;
use crate::source::{
    CommandRunner, DiskSource, MailTransport, MemorySource, SimulatedDisks, SimulatedMailer,
    SimulatedMemory, SimulatedRunner, SmtpMailer, SubprocessRunner, SystemDisks, SystemMemory,
};
use crate::trigger::{DiskSpaceMonitor, MemoryMonitor, TriggerDetector};
use ap_config::SourceMode;

pub fn disk_space_monitor(mode: SourceMode) -> PluginHandle {
    let source: Box<dyn DiskSource> = match mode {
        SourceMode::Simulated => Box::new(SimulatedDisks),
        SourceMode::Live => Box::new(SystemDisks),
    };
    let monitor = DiskSpaceMonitor::new(source, HostInfo::detect());
    PluginHandle::Trigger(TriggerDetector::new(Box::new(monitor)))
}

pub fn memory_monitor(mode: SourceMode) -> PluginHandle {
    let source: Box<dyn MemorySource> = match mode {
        SourceMode::Simulated => Box::new(SimulatedMemory),
        SourceMode::Live => Box::new(SystemMemory),
    };
    let monitor = MemoryMonitor::new(source, HostInfo::detect());
    PluginHandle::Trigger(TriggerDetector::new(Box::new(monitor)))
}

pub fn shell_command(mode: SourceMode) -> PluginHandle {
    let runner: Box<dyn CommandRunner> = match mode {
        SourceMode::Simulated => Box::new(SimulatedRunner),
        SourceMode::Live => Box::new(SubprocessRunner),
    };
    let plugin = ShellCommand::new(mode, runner);
    PluginHandle::Action(ActionExecutor::new(Box::new(plugin), HostInfo::detect()))
}

pub fn email_notification(mode: SourceMode) -> PluginHandle {
    let transport: Box<dyn MailTransport> = match mode {
        SourceMode::Simulated => Box::new(SimulatedMailer),
        SourceMode::Live => Box::new(SmtpMailer),
    };
    let plugin = EmailNotification::new(mode, transport);
    PluginHandle::Action(ActionExecutor::new(Box::new(plugin), HostInfo::detect()))
}
