use std::collections::BTreeMap;

use serde::Serialize;

use super::Accumulation;

/// File count and byte total for one bucket or aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagStats {
    pub files: usize,
    pub size: u64,
    pub size_formatted: String,
}

impl TagStats {
    fn add(&mut self, files: usize, size: u64) {
        self.files += files;
        self.size += size;
        self.size_formatted = format_file_size(self.size);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub files: usize,
    pub size: u64,
    pub size_formatted: String,
    pub tags: BTreeMap<String, TagStats>,
}

/// Aggregate statistics over an accumulation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub total_files: usize,
    pub total_size: u64,
    pub total_size_formatted: String,
    #[serde(rename = "library_stats")]
    pub libraries: BTreeMap<String, LibraryStats>,
    #[serde(rename = "tag_totals")]
    pub tags: BTreeMap<String, TagStats>,
}

impl ExportSummary {
    pub fn from_accumulation(acc: &Accumulation) -> Self {
        let mut summary = ExportSummary {
            total_size_formatted: format_file_size(0),
            ..Default::default()
        };

        for (library, buckets) in acc {
            let mut lib_stats = LibraryStats {
                size_formatted: format_file_size(0),
                ..Default::default()
            };

            for (tag, files) in buckets {
                let size: u64 = files.iter().map(|f| f.size).sum();

                let mut tag_stats = TagStats {
                    size_formatted: format_file_size(0),
                    ..Default::default()
                };
                tag_stats.add(files.len(), size);
                lib_stats.tags.insert(tag.clone(), tag_stats);

                lib_stats.files += files.len();
                lib_stats.size += size;

                summary
                    .tags
                    .entry(tag.clone())
                    .or_insert_with(|| TagStats {
                        size_formatted: format_file_size(0),
                        ..Default::default()
                    })
                    .add(files.len(), size);
            }

            lib_stats.size_formatted = format_file_size(lib_stats.size);
            summary.total_files += lib_stats.files;
            summary.total_size += lib_stats.size;
            summary.libraries.insert(library.clone(), lib_stats);
        }

        summary.total_size_formatted = format_file_size(summary.total_size);
        summary
    }
}

/// Human readable size with 1024-based units: "512 B", "1.5 KB", "4.0 GB".
pub fn format_file_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < 5 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    let prefix = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}B", bytes as f64 / div as f64, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FileInfo;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_file_size(4 * 1024 * 1024 * 1024), "4.0 GB");
        assert_eq!(format_file_size(u64::MAX), "16.0 EB");
    }

    #[test]
    fn test_summary_aggregates() {
        let mut acc = Accumulation::new();
        let movies = acc.entry("Movies".to_string()).or_default();
        movies.insert(
            "4K".to_string(),
            vec![FileInfo::new("/a", 1024), FileInfo::new("/b", 1024)],
        );
        movies.insert("Kids".to_string(), vec![FileInfo::new("/c", 512)]);
        let tv = acc.entry("TV".to_string()).or_default();
        tv.insert("4K".to_string(), vec![FileInfo::new("/d", 2048)]);

        let summary = ExportSummary::from_accumulation(&acc);
        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.total_size, 4608);
        assert_eq!(summary.total_size_formatted, "4.5 KB");
        assert_eq!(summary.libraries["Movies"].files, 3);
        assert_eq!(summary.libraries["Movies"].tags["Kids"].size, 512);
        assert_eq!(summary.tags["4K"].files, 3);
        assert_eq!(summary.tags["4K"].size_formatted, "4.0 KB");
    }

    #[test]
    fn test_empty_summary() {
        let summary = ExportSummary::from_accumulation(&Accumulation::new());
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.total_size_formatted, "0 B");
    }
}
