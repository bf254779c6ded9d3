//! Plain-text (gemtext-flavoured) rendering of a [`Report`].

use std::fmt::{self, Display, Formatter};

use super::stats::PathCount;
use super::Report;
use crate::gemini::status_description;

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Report for {}", self.capsule_name)?;
        writeln!(f, "{}", self.window)?;
        writeln!(f)?;

        let traffic = &self.traffic;
        writeln!(f, "## Capsule traffic")?;
        writeln!(f)?;
        writeln!(f, "Total requests: {}", traffic.total_requests)?;
        writeln!(f, "Unique IPs: {}", traffic.unique_clients)?;
        writeln!(f, "Response codes:")?;
        for (code, count) in &traffic.status_counts {
            writeln!(f, "* {code} ({}): {count}", status_description(*code))?;
        }
        writeln!(f, "Most requested paths:")?;
        write_paths(f, &traffic.top_paths)?;
        writeln!(f, "Unparsed access log lines: {}", traffic.unparsed_lines)?;

        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "### {}", section.title)?;
            writeln!(f)?;
            writeln!(f, "Visits: {}", section.visits)?;
            writeln!(f, "Unique IPs: {}", section.unique_clients)?;
            writeln!(f, "Most popular pages:")?;
            write_paths(f, &section.top_paths)?;
        }

        let errors = &self.errors;
        writeln!(f)?;
        writeln!(f, "## Errors")?;
        writeln!(f)?;
        writeln!(f, "Total errors: {}", errors.total_errors)?;
        if !errors.sample.is_empty() {
            writeln!(f, "Most recent:")?;
            for event in &errors.sample {
                writeln!(
                    f,
                    "* {}: {}",
                    event.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                    event.message
                )?;
            }
        }
        writeln!(f, "Unparsed error log lines: {}", errors.unparsed_lines)?;

        if let Some(messages) = &self.messages {
            writeln!(f)?;
            writeln!(f, "## Messages")?;
            writeln!(f)?;
            writeln!(f, "Total messages: {}", messages.total)?;
            writeln!(f, "Unread messages: {}", messages.unread)?;
        }

        Ok(())
    }
}

fn write_paths(f: &mut Formatter<'_>, paths: &[PathCount]) -> fmt::Result {
    if paths.is_empty() {
        return writeln!(f, "* (none)");
    }
    for p in paths {
        let unit = if p.hits == 1 { "hit" } else { "hits" };
        writeln!(f, "* {} ({} {unit})", p.path, p.hits)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logstats::ErrorEvent;
    use crate::report::stats::{ErrorStats, MessageStats, SectionStats, TrafficStats};
    use crate::window::DateWindow;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn report() -> Report {
        Report {
            capsule_name: "example.org".into(),
            window: DateWindow::new(NaiveDate::from_ymd_opt(2024, 3, 1), None),
            traffic: TrafficStats {
                total_requests: 3,
                unique_clients: 2,
                status_counts: BTreeMap::from([(20, 2), (51, 1)]),
                top_paths: vec![
                    PathCount {
                        path: "/".into(),
                        hits: 2,
                    },
                    PathCount {
                        path: "/nope".into(),
                        hits: 1,
                    },
                ],
                unparsed_lines: 0,
            },
            sections: vec![SectionStats {
                title: "Gemlog".into(),
                prefix: "/gemlog/".into(),
                visits: 0,
                unique_clients: 0,
                top_paths: vec![],
            }],
            errors: ErrorStats {
                total_errors: 1,
                sample: vec![ErrorEvent {
                    timestamp: Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap(),
                    message: "TLS handshake error".into(),
                }],
                unparsed_lines: 1,
            },
            messages: Some(MessageStats {
                total: 4,
                unread: 1,
            }),
        }
    }

    #[test]
    fn renders_sections_in_order() {
        let expected = "\
# Report for example.org
Period from 2024-03-01 to present.

## Capsule traffic

Total requests: 3
Unique IPs: 2
Response codes:
* 20 (SUCCESS): 2
* 51 (NOT FOUND): 1
Most requested paths:
* / (2 hits)
* /nope (1 hit)
Unparsed access log lines: 0

### Gemlog

Visits: 0
Unique IPs: 0
Most popular pages:
* (none)

## Errors

Total errors: 1
Most recent:
* 2024-03-02 08:00:00 UTC: TLS handshake error
Unparsed error log lines: 1

## Messages

Total messages: 4
Unread messages: 1
";
        assert_eq!(report().to_string(), expected);
    }

    #[test]
    fn messages_section_is_omitted_without_store() {
        let mut report = report();
        report.messages = None;
        let text = report.to_string();
        assert!(!text.contains("## Messages"));
        assert!(text.ends_with("Unparsed error log lines: 1\n"));
    }
}
