//! Shell command action plugin.

fn main() {
    let code = ap_core::cli::run("shell-command", ap_core::catalog::shell_command);
    std::process::exit(code.as_i32());
}
