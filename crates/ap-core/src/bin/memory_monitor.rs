//! Memory and swap usage trigger plugin.

fn main() {
    let code = ap_core::cli::run("memory-monitor", ap_core::catalog::memory_monitor);
    std::process::exit(code.as_i32());
}
