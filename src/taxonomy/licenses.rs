/// The closed set of license categories tracked in the aggregate store.
///
/// Every bucket corresponds to one counter column in the `locations` table.
/// Classification is total: identifiers outside the recognized set, and
/// repositories reporting no license at all, land in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LicenseBucket {
    Other,
    Wtfpl,
    Lgpl30,
    Bsd3,
    Unlicense,
    Lgpl21,
    Apache20,
    Bsd2,
    Epl10,
    Agpl30,
    Mit,
    Gpl20,
    Mpl20,
    Gpl30,
}

impl LicenseBucket {
    /// All buckets, in aggregate-store column order.
    pub const ALL: [LicenseBucket; 14] = [
        LicenseBucket::Other,
        LicenseBucket::Wtfpl,
        LicenseBucket::Lgpl30,
        LicenseBucket::Bsd3,
        LicenseBucket::Unlicense,
        LicenseBucket::Lgpl21,
        LicenseBucket::Apache20,
        LicenseBucket::Bsd2,
        LicenseBucket::Epl10,
        LicenseBucket::Agpl30,
        LicenseBucket::Mit,
        LicenseBucket::Gpl20,
        LicenseBucket::Mpl20,
        LicenseBucket::Gpl30,
    ];

    /// Maps a license identifier as reported by the repository API to a
    /// bucket. `None` means the repository carries no detectable license.
    pub fn classify(key: Option<&str>) -> LicenseBucket {
        match key {
            None => LicenseBucket::Other,
            Some(key) => match key {
                // Copyleft
                "gpl-2.0" => LicenseBucket::Gpl20,
                "gpl-3.0" => LicenseBucket::Gpl30,
                "lgpl-2.1" => LicenseBucket::Lgpl21,
                "lgpl-3.0" => LicenseBucket::Lgpl30,
                "agpl-3.0" => LicenseBucket::Agpl30,
                // Weak copyleft
                "mpl-2.0" => LicenseBucket::Mpl20,
                "epl-1.0" => LicenseBucket::Epl10,
                // Permissive
                "mit" => LicenseBucket::Mit,
                "bsd-3-clause" => LicenseBucket::Bsd3,
                "bsd-2-clause" => LicenseBucket::Bsd2,
                "apache-2.0" => LicenseBucket::Apache20,
                "unlicense" => LicenseBucket::Unlicense,
                "wtfpl" => LicenseBucket::Wtfpl,
                _ => LicenseBucket::Other,
            },
        }
    }

    /// Counter column name in the `locations` table. These identifiers come
    /// from this fixed list only, never from remote or row data.
    pub fn column(&self) -> &'static str {
        match self {
            LicenseBucket::Other => "license_other",
            LicenseBucket::Wtfpl => "license_wtfpl",
            LicenseBucket::Lgpl30 => "license_lgpl30",
            LicenseBucket::Bsd3 => "license_bsd3",
            LicenseBucket::Unlicense => "license_unlicense",
            LicenseBucket::Lgpl21 => "license_lgpl21",
            LicenseBucket::Apache20 => "license_apache20",
            LicenseBucket::Bsd2 => "license_bsd2",
            LicenseBucket::Epl10 => "license_epl10",
            LicenseBucket::Agpl30 => "license_agpl30",
            LicenseBucket::Mit => "license_mit",
            LicenseBucket::Gpl20 => "license_gpl20",
            LicenseBucket::Mpl20 => "license_mpl20",
            LicenseBucket::Gpl30 => "license_gpl30",
        }
    }

    pub(crate) fn index(&self) -> usize {
        LicenseBucket::ALL
            .iter()
            .position(|b| b == self)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_recognized_keys() {
        let expected = [
            ("gpl-2.0", LicenseBucket::Gpl20),
            ("gpl-3.0", LicenseBucket::Gpl30),
            ("lgpl-2.1", LicenseBucket::Lgpl21),
            ("lgpl-3.0", LicenseBucket::Lgpl30),
            ("agpl-3.0", LicenseBucket::Agpl30),
            ("mpl-2.0", LicenseBucket::Mpl20),
            ("epl-1.0", LicenseBucket::Epl10),
            ("mit", LicenseBucket::Mit),
            ("bsd-3-clause", LicenseBucket::Bsd3),
            ("bsd-2-clause", LicenseBucket::Bsd2),
            ("apache-2.0", LicenseBucket::Apache20),
            ("unlicense", LicenseBucket::Unlicense),
            ("wtfpl", LicenseBucket::Wtfpl),
        ];
        for (key, bucket) in expected {
            assert_eq!(LicenseBucket::classify(Some(key)), bucket);
        }
    }

    #[test]
    fn test_classify_unrecognized_falls_back_to_other() {
        assert_eq!(
            LicenseBucket::classify(Some("bsl-1.0")),
            LicenseBucket::Other
        );
        assert_eq!(LicenseBucket::classify(Some("")), LicenseBucket::Other);
        // Matching is exact, not case-insensitive
        assert_eq!(LicenseBucket::classify(Some("MIT")), LicenseBucket::Other);
    }

    #[test]
    fn test_classify_absent_is_other() {
        assert_eq!(LicenseBucket::classify(None), LicenseBucket::Other);
    }

    #[test]
    fn test_columns_are_distinct() {
        let mut columns: Vec<_> = LicenseBucket::ALL.iter().map(|b| b.column()).collect();
        columns.sort();
        columns.dedup();
        assert_eq!(columns.len(), LicenseBucket::ALL.len());
    }
}
