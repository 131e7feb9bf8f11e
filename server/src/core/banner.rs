//! Startup banner

use super::config::{AppConfig, is_all_interfaces};
use super::constants::APP_NAME;

// Label column width, widest label plus one space
const W: usize = 10;

/// Print listener, sink and processing settings
pub fn print_banner(config: &AppConfig, write_url: &str, catalog_types: usize) {
    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    let listener = &config.listener;
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m udp://{}",
        "collectd:",
        listener.bind_address()
    );

    if is_all_interfaces(&listener.host) {
        if let Ok(interfaces) = local_ip_address::list_afinet_netifas() {
            for (_, ip) in interfaces
                .iter()
                .filter(|(_, ip)| ip.is_ipv4() && !ip.is_loopback())
            {
                println!(
                    "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m udp://{}:{}",
                    "Network:", ip, listener.port
                );
            }
        }
    } else if listener.host == "127.0.0.1" || listener.host == "localhost" {
        println!(
            "  \x1b[90m➜  {:<W$} use --host 0.0.0.0 to accept remote collectd\x1b[0m",
            "Network:"
        );
    }

    println!(
        "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "InfluxDB:",
        terminal_link(write_url)
    );
    println!(
        "  \x1b[90m➜  {:<W$} {} types from {} file(s)\x1b[0m",
        "Types:",
        catalog_types,
        config.typesdb.len()
    );
    println!(
        "  \x1b[90m➜  {:<W$} counter={} derive={}\x1b[0m",
        "Rates:", config.rates.normalize, config.rates.store_rates
    );

    println!();
}

/// Cyan URL, wrapped in an OSC 8 hyperlink when stdout supports it
fn terminal_link(url: &str) -> String {
    if supports_hyperlinks::on(supports_hyperlinks::Stream::Stdout) {
        format!("\x1b]8;;{}\x07\x1b[36m{}\x1b[0m\x1b]8;;\x07", url, url)
    } else {
        format!("\x1b[36m{}\x1b[0m", url)
    }
}
