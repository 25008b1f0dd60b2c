use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::sync::{OnceLock, mpsc};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

/// Each statistic event is a set of key-value pairs. This enum specifies all
/// allowed keys and thus the columns of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatParameter {
    /// Time in seconds since collector start.
    Time,

    /// Kind of the event: "ADD", "REMOVE", "MODIFY", "FAILURE", "PLAN".
    EventKind,

    /// Name of the demand the event concerns.
    Demand,

    /// Name of the lightpath the event concerns.
    Lightpath,

    /// Outcome of the event: "OK", "NO_FEASIBLE_PATH", "RESOURCE_CONFLICT",
    /// "SWITCHED_TO_BACKUP", "RESTORED", "LEFT_DOWN", "REVERTED".
    Outcome,

    /// Name of the chosen transponder type.
    TransponderType,

    /// Length of the chosen primary route in km.
    PathLengthKm,

    /// First slot of the allocated block.
    StartSlot,

    /// Width of the allocated block in slots.
    NumSlots,

    /// Cost of the committed combination.
    Cost,

    /// Aggregate carried traffic after the event.
    CarriedGbps,

    /// Aggregate blocked traffic after the event.
    BlockedGbps,
}

/// Column order of the CSV output.
const COLUMNS: [StatParameter; 12] = [
    StatParameter::Time,
    StatParameter::EventKind,
    StatParameter::Demand,
    StatParameter::Lightpath,
    StatParameter::Outcome,
    StatParameter::TransponderType,
    StatParameter::PathLengthKm,
    StatParameter::StartSlot,
    StatParameter::NumSlots,
    StatParameter::Cost,
    StatParameter::CarriedGbps,
    StatParameter::BlockedGbps,
];

impl StatParameter {
    fn header(&self) -> &'static str {
        match self {
            StatParameter::Time => "Time",
            StatParameter::EventKind => "EventKind",
            StatParameter::Demand => "Demand",
            StatParameter::Lightpath => "Lightpath",
            StatParameter::Outcome => "Outcome",
            StatParameter::TransponderType => "TransponderType",
            StatParameter::PathLengthKm => "PathLengthKm",
            StatParameter::StartSlot => "StartSlot",
            StatParameter::NumSlots => "NumSlots",
            StatParameter::Cost => "Cost",
            StatParameter::CarriedGbps => "CarriedGbps",
            StatParameter::BlockedGbps => "BlockedGbps",
        }
    }
}

/// Values keep their native format and are only rendered when written.
#[derive(Debug, Clone)]
pub enum StatValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for StatValue {
    fn from(v: i64) -> Self {
        StatValue::Integer(v)
    }
}

impl From<usize> for StatValue {
    fn from(v: usize) -> Self {
        StatValue::Integer(v as i64)
    }
}

impl From<f64> for StatValue {
    fn from(v: f64) -> Self {
        StatValue::Float(v)
    }
}

impl From<String> for StatValue {
    fn from(v: String) -> Self {
        StatValue::Text(v)
    }
}

impl From<&str> for StatValue {
    fn from(v: &str) -> Self {
        StatValue::Text(v.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatisticEvent {
    data: HashMap<StatParameter, StatValue>,
}

impl StatisticEvent {
    pub fn new() -> Self {
        Self { data: HashMap::new() }
    }

    pub fn set<V: Into<StatValue>>(&mut self, param: StatParameter, value: V) -> &mut Self {
        self.data.insert(param, value.into());
        self
    }

    pub fn get(&self, param: StatParameter) -> Option<&StatValue> {
        self.data.get(&param)
    }
}

/// Messages sent from the planning/simulation thread to the writer thread.
enum StatsMessage {
    Log(StatisticEvent),
    Flush,
}

/// Handle that allows components to log events; holds the sender side of the
/// channel to the background writer thread.
pub struct StatsCollector {
    sender: mpsc::Sender<StatsMessage>,
    start_time: u64,
}

impl StatsCollector {
    /// Initializes the statistics system and spawns the background thread
    /// that manages the file writing.
    pub fn init(filename: Option<String>) -> Self {
        let (tx, rx) = mpsc::channel();

        let start_time = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();

        thread::spawn(move || {
            Self::worker_loop(rx, filename);
        });

        StatsCollector { sender: tx, start_time }
    }

    fn worker_loop(rx: mpsc::Receiver<StatsMessage>, filename: Option<String>) {
        let writer: Box<dyn Write> = match filename {
            Some(f) => match File::create(&f) {
                Ok(file) => Box::new(file),
                Err(e) => {
                    log::error!("Stats: could not create statistics file '{}': {}. Falling back to stdout.", f, e);
                    Box::new(io::stdout())
                }
            },
            None => Box::new(io::stdout()),
        };

        let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);

        let headers: Vec<&str> = COLUMNS.iter().map(|c| c.header()).collect();
        if let Err(e) = csv_wtr.write_record(&headers) {
            log::error!("Stats: failed to write headers: {}", e);
        }

        for msg in rx {
            match msg {
                StatsMessage::Log(event) => {
                    let row: Vec<String> = COLUMNS
                        .iter()
                        .map(|param| match event.data.get(param) {
                            Some(StatValue::Text(t)) => t.clone(),
                            Some(StatValue::Integer(i)) => i.to_string(),
                            Some(StatValue::Float(f)) => f.to_string(),
                            None => "NA".to_string(),
                        })
                        .collect();

                    if let Err(e) = csv_wtr.write_record(&row) {
                        log::error!("Stats: failed to write record: {}", e);
                    }
                }
                StatsMessage::Flush => {
                    let _ = csv_wtr.flush();
                }
            }
        }

        let _ = csv_wtr.flush();
    }

    /// Logs an event. Non-blocking: the event is handed to the writer thread.
    pub fn add_event(&self, mut event: StatisticEvent) {
        if event.get(StatParameter::Time).is_none() {
            let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
            event.set(StatParameter::Time, now.saturating_sub(self.start_time) as i64);
        }

        // A crashed writer thread must not take the run down with it.
        let _ = self.sender.send(StatsMessage::Log(event));
    }

    pub fn flush(&self) {
        let _ = self.sender.send(StatsMessage::Flush);
    }
}

static GLOBAL_STATS: OnceLock<StatsCollector> = OnceLock::new();

/// Initializes the global statistics collector.
pub fn init_global(filename: Option<String>) {
    let collector = StatsCollector::init(filename);
    let _ = GLOBAL_STATS.set(collector);
}

/// Logs an event to the global collector, if one was initialized.
pub fn add_global_event(event: StatisticEvent) {
    if let Some(collector) = GLOBAL_STATS.get() {
        collector.add_event(event);
    }
}

pub fn flush_global() {
    if let Some(collector) = GLOBAL_STATS.get() {
        collector.flush();
    }
}
