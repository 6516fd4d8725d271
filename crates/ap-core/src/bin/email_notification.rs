//! Email notification action plugin.

fn main() {
    let code = ap_core::cli::run("email-notification", ap_core::catalog::email_notification);
    std::process::exit(code.as_i32());
}
