use std::{
    io,
    path::{Path, PathBuf},
    time::Instant,
};

use chrono::NaiveDate;
use csv::{StringRecord, Writer};
use shared::domain::Metric;
use tokio::sync::mpsc;
use tracing::info;

use crate::{
    error::{DatasetError, ParseError},
    MetricValues, Observation,
};

const COUNTRY_CODE_COLUMN: &str = "country_region_code";
const COUNTRY_COLUMN: &str = "country_region";
const SUB_REGION_1_COLUMN: &str = "sub_region_1";
const SUB_REGION_2_COLUMN: &str = "sub_region_2";
const DATE_COLUMN: &str = "date";

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub cache_path: PathBuf,
    pub mapping_path: PathBuf,
    pub source_url: String,
    pub country_code: String,
}

/// Positions of the columns the dashboard reads, looked up by header name.
#[derive(Debug, Clone)]
struct Columns {
    country_code: usize,
    country: Option<usize>,
    sub_region_1: usize,
    sub_region_2: usize,
    date: usize,
    metrics: [usize; 6],
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, ParseError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|header| header.trim() == name)
                .ok_or(ParseError::MissingColumn(name))
        };

        let mut metrics = [0; 6];
        for metric in Metric::ALL {
            metrics[metric.index()] = find(metric.column())?;
        }

        Ok(Self {
            country_code: find(COUNTRY_CODE_COLUMN)?,
            country: find(COUNTRY_COLUMN).ok(),
            sub_region_1: find(SUB_REGION_1_COLUMN)?,
            sub_region_2: find(SUB_REGION_2_COLUMN)?,
            date: find(DATE_COLUMN)?,
            metrics,
        })
    }
}

/// Mobility rows kept as raw CSV records so the cache file can be written back
/// with every source column intact.
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: StringRecord,
    columns: Columns,
    records: Vec<StringRecord>,
}

impl RawTable {
    pub fn read<R: io::Read>(source: R) -> Result<Self, ParseError> {
        Self::read_filtered(source, |_, _| true)
    }

    /// Reads `source`, keeping only rows whose country code equals `country_code`.
    pub fn read_country<R: io::Read>(source: R, country_code: &str) -> Result<Self, ParseError> {
        Self::read_filtered(source, |record, columns| {
            record.get(columns.country_code).map(str::trim) == Some(country_code)
        })
    }

    fn read_filtered<R, F>(source: R, keep: F) -> Result<Self, ParseError>
    where
        R: io::Read,
        F: Fn(&StringRecord, &Columns) -> bool,
    {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(source);
        let headers = reader.headers()?.clone();
        let columns = Columns::from_headers(&headers)?;

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            if keep(&record, &columns) {
                records.push(record);
            }
        }

        Ok(Self {
            headers,
            columns,
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn write<W: io::Write>(&self, sink: W) -> Result<(), csv::Error> {
        let mut writer = Writer::from_writer(sink);
        writer.write_record(&self.headers)?;
        for record in &self.records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn observations(&self) -> Result<Vec<Observation>, ParseError> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| self.observation(index, record))
            .collect()
    }

    fn observation(&self, index: usize, record: &StringRecord) -> Result<Observation, ParseError> {
        let columns = &self.columns;
        let field = |position: usize| record.get(position).map(str::trim).unwrap_or_default();
        let optional = |position: usize| {
            let value = field(position);
            (!value.is_empty()).then(|| value.to_string())
        };

        let raw_date = field(columns.date);
        let date = parse_date(raw_date).ok_or_else(|| ParseError::InvalidDate {
            line: record
                .position()
                .map(|position| position.line())
                .unwrap_or(index as u64 + 2),
            value: raw_date.to_string(),
        })?;

        let mut metrics = [None; 6];
        for metric in Metric::ALL {
            metrics[metric.index()] = parse_metric(field(columns.metrics[metric.index()]));
        }

        Ok(Observation {
            country_code: field(columns.country_code).to_string(),
            country: columns.country.and_then(optional),
            sub_region_1: optional(columns.sub_region_1),
            sub_region_2: optional(columns.sub_region_2),
            date,
            metrics: MetricValues::new(metrics),
        })
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let day = value.split(|c: char| c == ' ' || c == 'T').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_metric(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

/// Reads the cached country table from disk.
pub fn read_cache(path: &Path) -> Result<Vec<Observation>, DatasetError> {
    let unavailable = |source: ParseError| DatasetError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path)
        .map_err(|error| unavailable(ParseError::Csv(csv::Error::from(error))))?;
    let table = RawTable::read(io::BufReader::new(file)).map_err(unavailable)?;
    table.observations().map_err(unavailable)
}

/// Writes `table` to `path`, replacing any existing file.
pub fn write_cache(table: &RawTable, path: &Path) -> Result<(), DatasetError> {
    let cache_write = |source: csv::Error| DatasetError::CacheWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(path).map_err(|error| cache_write(error.into()))?;
    table.write(io::BufWriter::new(file)).map_err(cache_write)
}

/// Number of downloaded chunks buffered between the network and the parser.
const CHUNK_BUFFER: usize = 16;

/// Blocking [`io::Read`] over chunks sent from an async task. Ends when the
/// sender is dropped.
pub(crate) struct ChunkReader<T> {
    chunks: mpsc::Receiver<T>,
    current: Option<T>,
    offset: usize,
}

impl<T> ChunkReader<T> {
    pub(crate) fn new(chunks: mpsc::Receiver<T>) -> Self {
        Self {
            chunks,
            current: None,
            offset: 0,
        }
    }
}

impl<T: AsRef<[u8]>> io::Read for ChunkReader<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if let Some(chunk) = &self.current {
                let rest = &chunk.as_ref()[self.offset..];
                if !rest.is_empty() {
                    let n = rest.len().min(buf.len());
                    buf[..n].copy_from_slice(&rest[..n]);
                    self.offset += n;
                    return Ok(n);
                }
            }
            match self.chunks.blocking_recv() {
                Some(chunk) => {
                    self.current = Some(chunk);
                    self.offset = 0;
                }
                None => return Ok(0),
            }
        }
    }
}

/// Downloads the full multi-country source, keeps the configured country,
/// rewrites the cache and returns the kept rows.
///
/// The response is filtered as it streams in. The cache is only replaced
/// once the download completed and every kept row parsed, so a failed
/// refresh leaves the previous cache in place.
pub async fn refresh_cache(config: &LoaderConfig) -> Result<Vec<Observation>, DatasetError> {
    let started = Instant::now();
    info!(url = %config.source_url, "downloading mobility source");
    let mut response = reqwest::get(&config.source_url)
        .await?
        .error_for_status()?;

    let (chunks, receiver) = mpsc::channel(CHUNK_BUFFER);
    let country_code = config.country_code.clone();
    let parser = tokio::task::spawn_blocking(move || {
        let table = RawTable::read_country(ChunkReader::new(receiver), &country_code)?;
        let observations = table.observations()?;
        Ok::<_, ParseError>((table, observations))
    });

    let mut downloaded = 0usize;
    let download: Result<(), reqwest::Error> = async {
        while let Some(chunk) = response.chunk().await? {
            downloaded += chunk.len();
            // The parser hangs up early on a malformed header.
            if chunks.send(chunk).await.is_err() {
                break;
            }
        }
        Ok(())
    }
    .await;
    drop(chunks);

    let parsed = parser.await?;
    download?;
    let (table, observations) = parsed.map_err(DatasetError::MalformedSource)?;
    info!(
        bytes = downloaded,
        rows = table.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "mobility source downloaded"
    );

    let cache_path = config.cache_path.clone();
    let written_path = cache_path.clone();
    tokio::task::spawn_blocking(move || write_cache(&table, &written_path)).await??;
    info!(
        path = %cache_path.display(),
        rows = observations.len(),
        country_code = %config.country_code,
        "mobility cache rewritten"
    );
    Ok(observations)
}

/// Produces the base observation table, from the network when `refresh` is
/// set and from the cache file otherwise. A missing cache is never replaced
/// by a download.
pub async fn load(config: &LoaderConfig, refresh: bool) -> Result<Vec<Observation>, DatasetError> {
    if refresh {
        return refresh_cache(config).await;
    }

    let started = Instant::now();
    let path = config.cache_path.clone();
    let observations = tokio::task::spawn_blocking(move || read_cache(&path)).await??;
    info!(
        path = %config.cache_path.display(),
        rows = observations.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "mobility cache loaded"
    );
    Ok(observations)
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
