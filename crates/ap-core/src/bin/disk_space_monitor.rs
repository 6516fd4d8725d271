//! Disk space monitor trigger plugin.

fn main() {
    let code = ap_core::cli::run("disk-space-monitor", ap_core::catalog::disk_space_monitor);
    std::process::exit(code.as_i32());
}
