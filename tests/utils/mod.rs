// Integration test utilities
//
// A loopback HTTP stub for the reqwest clients and in-memory collaborators for
// driving whole calibration runs without sleeping or touching the network.
#![allow(dead_code)]

use dimcal::clock::Clock;
use dimcal::dimmer::{DimmerAdmin, PathProbabilityRule, ResponseTimes};
use dimcal::http::ApiError;
use dimcal::loadgen::{LoadGenerator, LoadGeneratorError};
use dimcal::reseed::DataReseeder;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// A request as seen by the stub server
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

type Responder = dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync;

/// Minimal HTTP/1.1 server on 127.0.0.1 answering every request with `respond`
pub struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubServer {
    pub fn start<F>(respond: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let respond: Arc<Responder> = Arc::new(respond);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let Some(request) = read_request(&mut stream) else {
                    continue;
                };
                let (status, body) = respond(&request);
                recorded.lock().expect("request log").push(request);

                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    if status < 400 { "OK" } else { "Error" },
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        StubServer { base_url, requests }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("request log").clone()
    }
}

fn read_request(stream: &mut std::net::TcpStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().ok()?;
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;

    Some(RecordedRequest {
        method,
        path,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Every collaborator call made during a run, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ClearProbabilities,
    SetProbabilities(Vec<PathProbabilityRule>),
    StartCollector,
    StopCollector,
    CollectorStats,
    LoadStart,
    LoadStop,
    SetLevel(u32),
    Sleep(Duration),
    Reseed,
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Operation name -> 1-based call number that fails
#[derive(Debug, Clone, Default)]
pub struct Faults {
    fail_on: HashMap<&'static str, usize>,
    calls: HashMap<&'static str, usize>,
}

impl Faults {
    pub fn fail(mut self, operation: &'static str, call: usize) -> Self {
        self.fail_on.insert(operation, call);
        self
    }

    /// Count a call and report whether it must fail
    fn hit(&mut self, operation: &'static str) -> bool {
        let count = self.calls.entry(operation).or_insert(0);
        *count += 1;
        self.fail_on.get(operation) == Some(count)
    }
}

fn injected(operation: &str) -> ApiError {
    ApiError::Status {
        method: reqwest::Method::POST,
        url: format!("http://fake/{}", operation),
        status: 500,
        body: "injected failure".to_string(),
    }
}

/// Dimmer whose P95 is a function of the active probabilities
pub struct FakeDimmer {
    log: EventLog,
    faults: Faults,
    active: Vec<PathProbabilityRule>,
    latency: Box<dyn Fn(&[PathProbabilityRule]) -> f64>,
}

impl FakeDimmer {
    pub fn new<F>(log: EventLog, latency: F) -> Self
    where
        F: Fn(&[PathProbabilityRule]) -> f64 + 'static,
    {
        FakeDimmer {
            log,
            faults: Faults::default(),
            active: Vec::new(),
            latency: Box::new(latency),
        }
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    fn call(&mut self, operation: &'static str, event: Event) -> Result<(), ApiError> {
        self.log.borrow_mut().push(event);
        if self.faults.hit(operation) {
            return Err(injected(operation));
        }
        Ok(())
    }
}

impl DimmerAdmin for FakeDimmer {
    fn clear_probabilities(&mut self) -> Result<(), ApiError> {
        self.call("clear_probabilities", Event::ClearProbabilities)?;
        self.active.clear();
        Ok(())
    }

    fn set_probabilities(&mut self, rules: &[PathProbabilityRule]) -> Result<(), ApiError> {
        self.call("set_probabilities", Event::SetProbabilities(rules.to_vec()))?;
        self.active = rules.to_vec();
        Ok(())
    }

    fn start_collector(&mut self) -> Result<(), ApiError> {
        self.call("start_collector", Event::StartCollector)
    }

    fn stop_collector(&mut self) -> Result<(), ApiError> {
        self.call("stop_collector", Event::StopCollector)
    }

    fn collector_stats(&mut self) -> Result<ResponseTimes, ApiError> {
        self.call("collector_stats", Event::CollectorStats)?;
        let p95 = (self.latency)(&self.active);
        Ok(ResponseTimes {
            p50: p95 * 0.5,
            p75: p95 * 0.75,
            p95,
        })
    }
}

/// How the first `stop()` of a run behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstStop {
    Ok,
    NotRunning,
    Fatal,
}

pub struct FakeLoadGenerator {
    log: EventLog,
    faults: Faults,
    first_stop: FirstStop,
    stops: usize,
}

impl FakeLoadGenerator {
    pub fn new(log: EventLog) -> Self {
        FakeLoadGenerator {
            log,
            faults: Faults::default(),
            first_stop: FirstStop::Ok,
            stops: 0,
        }
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    pub fn with_first_stop(mut self, first_stop: FirstStop) -> Self {
        self.first_stop = first_stop;
        self
    }

    fn call(&mut self, operation: &'static str, event: Event) -> Result<(), LoadGeneratorError> {
        self.log.borrow_mut().push(event);
        if self.faults.hit(operation) {
            return Err(injected(operation).into());
        }
        Ok(())
    }
}

impl LoadGenerator for FakeLoadGenerator {
    fn start(&mut self) -> Result<(), LoadGeneratorError> {
        self.call("start", Event::LoadStart)
    }

    fn stop(&mut self) -> Result<(), LoadGeneratorError> {
        self.stops += 1;
        if self.stops == 1 {
            self.log.borrow_mut().push(Event::LoadStop);
            return match self.first_stop {
                FirstStop::Ok => Ok(()),
                FirstStop::NotRunning => Err(LoadGeneratorError::NotRunning(
                    "test execution was already paused".to_string(),
                )),
                FirstStop::Fatal => Err(injected("stop").into()),
            };
        }
        self.call("stop", Event::LoadStop)
    }

    fn set_level(&mut self, level: u32) -> Result<(), LoadGeneratorError> {
        self.call("set_level", Event::SetLevel(level))
    }
}

/// Records requested waits instead of sleeping
pub struct FakeClock {
    log: EventLog,
}

impl FakeClock {
    pub fn new(log: EventLog) -> Self {
        FakeClock { log }
    }
}

impl Clock for FakeClock {
    fn sleep(&mut self, duration: Duration) {
        self.log.borrow_mut().push(Event::Sleep(duration));
    }
}

pub struct FakeReseeder {
    log: EventLog,
    faults: Faults,
}

impl FakeReseeder {
    pub fn new(log: EventLog) -> Self {
        FakeReseeder {
            log,
            faults: Faults::default(),
        }
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }
}

impl DataReseeder for FakeReseeder {
    fn reseed(&mut self) -> Result<(), ApiError> {
        self.log.borrow_mut().push(Event::Reseed);
        if self.faults.hit("reseed") {
            return Err(injected("reseed"));
        }
        Ok(())
    }
}

pub fn new_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn paths(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Probability of `path` in a rule set, 0.0 if absent
pub fn probability(rules: &[PathProbabilityRule], path: &str) -> f64 {
    rules
        .iter()
        .find(|r| r.path == path)
        .map(|r| r.probability)
        .unwrap_or(0.0)
}
