//! Satellite catalog: TLE download, date-keyed cache and parsing.

use chrono::{NaiveDate, Utc};
use log::{info, warn};
use sgp4::Elements;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::satellite::Satellite;

#[derive(Debug, Error)]
pub enum TleError {
    #[error("failed to download {url}: {message}")]
    Download { url: String, message: String },

    #[error("cache I/O on {path}: {source}")]
    Cache {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no valid satellites found in TLE data")]
    Empty,
}

/// Cache file for an observation date, e.g. `GPS_OPS_2021-07-07.txt`.
pub fn cache_file(cache_dir: &Path, date: NaiveDate) -> PathBuf {
    cache_dir.join(format!("GPS_OPS_{}.txt", date.format("%Y-%m-%d")))
}

/// Returns the path of the TLE set for `date`, downloading it if the cache
/// has no copy yet. Future dates use today's set.
pub fn fetch_tle(url: &str, cache_dir: &Path, date: NaiveDate) -> Result<PathBuf, TleError> {
    let date = date.min(Utc::now().date_naive());
    let path = cache_file(cache_dir, date);
    if path.exists() {
        info!("Found {} in cache", path.display());
        return Ok(path);
    }

    info!("Downloading TLE set for {date} from {url}");
    let body = ureq::get(url)
        .call()
        .map_err(|e| TleError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?
        .into_string()
        .map_err(|e| TleError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    fs::create_dir_all(cache_dir).map_err(|source| TleError::Cache {
        path: cache_dir.to_path_buf(),
        source,
    })?;
    fs::write(&path, body).map_err(|source| TleError::Cache {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn load_tle_file(path: &Path, tracked: &[String]) -> Result<Vec<Satellite>, TleError> {
    let data = fs::read_to_string(path).map_err(|source| TleError::Cache {
        path: path.to_path_buf(),
        source,
    })?;
    parse_multiple_tles(&data, tracked)
}

/// Parses three-line element sets. When `tracked` is non-empty only names
/// containing one of its entries are kept.
pub fn parse_multiple_tles(tle_data: &str, tracked: &[String]) -> Result<Vec<Satellite>, TleError> {
    let lines: Vec<&str> = tle_data.lines().map(|l| l.trim_end()).collect();
    let mut satellites = Vec::new();

    let mut i = 0;
    while i + 2 < lines.len() {
        if !lines[i].is_empty() && lines[i + 1].starts_with('1') && lines[i + 2].starts_with('2') {
            let name = lines[i].trim().to_string();

            let should_track =
                tracked.is_empty() || tracked.iter().any(|wanted| name.contains(wanted.as_str()));

            if should_track {
                match Elements::from_tle(
                    Some(name.clone()),
                    lines[i + 1].as_bytes(),
                    lines[i + 2].as_bytes(),
                ) {
                    Ok(elements) => satellites.push(Satellite::new(name, elements)),
                    Err(e) => warn!("Failed to parse TLE for {name}: {e:?}"),
                }
            }

            i += 3;
        } else {
            i += 1;
        }
    }

    if satellites.is_empty() {
        return Err(TleError::Empty);
    }

    Ok(satellites)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GPS_TLE: &str = "\
GPS BIIR-2  (PRN 13)
1 24876U 97035A   21187.50000000  .00000034  00000-0  00000-0 0  9992
2 24876  55.7058 142.8561 0044429  54.5437 305.9264  2.00562986176154
GPS BIIR-2  (PRN 99)
1 24876U 97035A   21187.50000000  .00000034
2 24876  55.7058 142.8561 0044429  54.5437 305.9264  2.00562986176154
";

    #[test]
    fn test_parse_skips_malformed_set() {
        // the second set has a truncated line 1
        let satellites = parse_multiple_tles(GPS_TLE, &[]).unwrap();
        assert_eq!(satellites.len(), 1);
        assert_eq!(satellites[0].prn, "PRN 13");
    }

    #[test]
    fn test_parse_tracked_filter() {
        let tracked = vec!["PRN 05".to_string()];
        assert!(matches!(
            parse_multiple_tles(GPS_TLE, &tracked),
            Err(TleError::Empty)
        ));
        let tracked = vec!["PRN 13".to_string()];
        assert_eq!(parse_multiple_tles(GPS_TLE, &tracked).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(parse_multiple_tles("", &[]), Err(TleError::Empty)));
        assert!(matches!(
            parse_multiple_tles("garbage\n", &[]),
            Err(TleError::Empty)
        ));
    }

    #[test]
    fn test_cached_file_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2021, 7, 7).unwrap();
        let path = cache_file(dir.path(), date);
        assert!(path.ends_with("GPS_OPS_2021-07-07.txt"));
        fs::write(&path, GPS_TLE).unwrap();

        // an unroutable URL proves the network is not touched
        let fetched = fetch_tle("http://invalid.invalid/gps-ops.txt", dir.path(), date).unwrap();
        assert_eq!(fetched, path);
        assert_eq!(load_tle_file(&fetched, &[]).unwrap().len(), 1);
    }
}
