use crate::runner::SuccessPolicy;

/// Packet counters from the summary block `ping` prints on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingSummary {
    pub transmitted: u32,
    pub received: u32,
}

impl PingSummary {
    pub fn satisfies(&self, policy: SuccessPolicy) -> bool {
        match policy {
            SuccessPolicy::Any => self.received > 0,
            SuccessPolicy::All => self.transmitted > 0 && self.received >= self.transmitted,
        }
    }
}

/// Finds the packet summary in `ping` output.
///
/// Understands the iputils/BSD form (`4 packets transmitted, 3 received`,
/// `4 packets transmitted, 3 packets received`) and the Windows form
/// (`Packets: Sent = 4, Received = 3, Lost = 1`).
pub fn parse_ping_summary(text: &str) -> Option<PingSummary> {
    for line in text.lines() {
        let lower = line.trim().to_ascii_lowercase();
        if lower.is_empty() {
            continue;
        }

        if lower.contains("transmitted") {
            if let Some(summary) = parse_unix_summary(&lower) {
                return Some(summary);
            }
        }

        if lower.contains("sent =") {
            if let Some(summary) = parse_windows_summary(&lower) {
                return Some(summary);
            }
        }
    }

    None
}

fn parse_unix_summary(line: &str) -> Option<PingSummary> {
    let mut transmitted = None;
    let mut received = None;

    for segment in line.split(',') {
        let segment = segment.trim();
        if segment.ends_with("transmitted") {
            transmitted = leading_number(segment);
        } else if segment.ends_with("received") {
            received = leading_number(segment);
        }
    }

    Some(PingSummary {
        transmitted: transmitted?,
        received: received?,
    })
}

fn parse_windows_summary(line: &str) -> Option<PingSummary> {
    let mut transmitted = None;
    let mut received = None;

    for segment in line.split(',') {
        let Some((key, value)) = segment.split_once('=') else {
            continue;
        };
        let key = key.trim().trim_start_matches("packets:").trim();
        match key {
            "sent" => transmitted = leading_number(value.trim()),
            "received" => received = leading_number(value.trim()),
            _ => {}
        }
    }

    Some(PingSummary {
        transmitted: transmitted?,
        received: received?,
    })
}

fn leading_number(segment: &str) -> Option<u32> {
    let digits: String = segment
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
