use clap::Parser;
use domain_auth_checker::{CheckConfig, DnsResolver, DomainChecker};

#[derive(Parser)]
#[command(about = "Check a domain's email authentication and mail-relay posture")]
struct Cli {
    /// Domain to check
    #[arg(short, long)]
    domain: String,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CheckConfig::default();
    let resolver = DnsResolver::new(&config)?;
    let checker = DomainChecker::new(resolver, config);

    let result = match checker.check_domain(&cli.domain).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Domain check for: {}", result.domain);

    println!("  SPF: {}", if result.spf.exists { "found" } else { "not found" });
    for record in &result.spf.records {
        println!("    {record}");
    }

    if result.dkim.is_empty() {
        println!("  DKIM: no selectors found");
    } else {
        println!("  DKIM selectors:");
        for (selector, finding) in &result.dkim {
            println!("    {selector} ({})", finding.domain);
        }
    }

    println!("  DMARC: {}", if result.dmarc.exists { "found" } else { "not found" });
    for record in &result.dmarc.records {
        println!("    {record}");
    }

    println!("  MX: {}", if result.mx.exists { "found" } else { "not found" });
    for record in &result.mx.records {
        println!("    {record}");
    }

    for probe in &result.smtp {
        if probe.success {
            println!(
                "  SMTP {}:{} connected (starttls: {}, open relay: {})",
                probe.host, probe.port, probe.supports_starttls, probe.open_relay
            );
        } else {
            println!(
                "  SMTP {}:{} failed: {}",
                probe.host,
                probe.port,
                probe.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    match &result.email_relay.error {
        Some(e) => println!("  Email relay: check failed: {e}"),
        None => {
            println!(
                "  Email relay: {}",
                if result.email_relay.overall_configured {
                    "configured"
                } else {
                    "not configured"
                }
            );
            for (subdomain, status) in &result.email_relay.subdomains {
                println!(
                    "    {subdomain}: {} (mx: {}, a: {})",
                    if status.configured { "configured" } else { "not configured" },
                    status.mx_exists,
                    status.a_exists
                );
            }
        }
    }

    println!("  Recommendations: {}", result.summary.recommendations);

    Ok(())
}
