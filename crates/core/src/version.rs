//! Protocol version negotiation.
//!
//! The host reports the protocol versions it supports; the client selects the
//! greatest milestone it understands that the host meets. Selection is a
//! single lookup over a descending milestone table.

use qbx_protocol::QbxmlVersion;

/// Milestone versions this client knows how to speak, newest first.
pub const MILESTONES: &[QbxmlVersion] = &[
    QbxmlVersion::new(6, 0),
    QbxmlVersion::new(5, 0),
    QbxmlVersion::new(4, 0),
    QbxmlVersion::new(3, 0),
    QbxmlVersion::new(2, 0),
    QbxmlVersion::new(1, 1),
    QbxmlVersion::new(1, 0),
];

/// Selects the greatest milestone supported by the host.
///
/// Host-reported versions that do not parse as numbers are ignored. When the
/// host meets none of the higher milestones (or reports nothing usable), the
/// oldest milestone (1.0) is selected.
pub fn negotiate(supported: &[String]) -> QbxmlVersion {
    let highest = supported
        .iter()
        .filter_map(|v| v.parse::<f64>().ok())
        .fold(0.0_f64, f64::max);

    MILESTONES
        .iter()
        .copied()
        .find(|m| highest >= milestone_value(*m))
        .unwrap_or(QbxmlVersion::new(1, 0))
}

fn milestone_value(version: QbxmlVersion) -> f64 {
    f64::from(version.major) + f64::from(version.minor) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn picks_the_greatest_supported_milestone() {
        assert_eq!(
            negotiate(&versions(&["1.0", "1.1", "4.0"])),
            QbxmlVersion::new(4, 0)
        );
    }

    #[test]
    fn caps_at_the_newest_known_milestone() {
        assert_eq!(
            negotiate(&versions(&["7.0", "8.0"])),
            QbxmlVersion::new(6, 0)
        );
    }

    #[test]
    fn intermediate_versions_round_down() {
        assert_eq!(
            negotiate(&versions(&["4.5"])),
            QbxmlVersion::new(4, 0)
        );
        assert_eq!(
            negotiate(&versions(&["1.1"])),
            QbxmlVersion::new(1, 1)
        );
    }

    #[test]
    fn defaults_to_the_oldest_milestone() {
        assert_eq!(negotiate(&versions(&["0.5"])), QbxmlVersion::new(1, 0));
        assert_eq!(negotiate(&[]), QbxmlVersion::new(1, 0));
        assert_eq!(
            negotiate(&versions(&["not-a-version"])),
            QbxmlVersion::new(1, 0)
        );
    }
}
