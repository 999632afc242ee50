use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use eframe::egui::Vec2;
use tracing::{debug, error, warn};

use crate::config::LayoutConfig;
use crate::graph::ResolvedGraph;
use crate::layout::{LayoutEngine, Snapshot};

pub type Waker = Box<dyn Fn() + Send>;

#[derive(Debug)]
pub enum Command {
    Init { generation: u64, graph: ResolvedGraph },
    Pin { id: String, position: Vec2 },
    Release { id: String },
    Shutdown,
}

#[derive(Clone, Debug)]
pub struct Tick {
    pub generation: u64,
    pub snapshot: Snapshot,
}

fn newest_current(ticks: impl IntoIterator<Item = Tick>, generation: u64) -> Option<Tick> {
    ticks
        .into_iter()
        .filter(|tick| tick.generation == generation)
        .last()
}

pub struct SimulationHandle {
    commands: Option<Sender<Command>>,
    ticks: Option<Receiver<Tick>>,
    worker: Option<JoinHandle<()>>,
    generation: u64,
    latest: Option<Snapshot>,
}

impl SimulationHandle {
    /// Starts the layout worker. `waker` runs on the worker thread after
    /// each tick is sent.
    pub fn spawn(config: LayoutConfig, step_interval: Duration, waker: Waker) -> Self {
        let (command_tx, command_rx) = mpsc::channel();
        let (tick_tx, tick_rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("layout-worker".to_owned())
            .spawn(move || {
                Worker {
                    engine: LayoutEngine::new(config),
                    warmup_steps: config.warmup_steps,
                    generation: 0,
                    ticks: tick_tx,
                    waker,
                    step_interval,
                    next_step: Instant::now(),
                }
                .run(command_rx);
            });

        match spawned {
            Ok(worker) => Self {
                commands: Some(command_tx),
                ticks: Some(tick_rx),
                worker: Some(worker),
                generation: 0,
                latest: None,
            },
            Err(error) => {
                error!(%error, "failed to start layout worker");
                Self::disconnected()
            }
        }
    }

    pub fn disconnected() -> Self {
        Self {
            commands: None,
            ticks: None,
            worker: None,
            generation: 0,
            latest: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.commands.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Replaces the worker's graph. The previous snapshot is forgotten and
    /// ticks from earlier generations are dropped from here on.
    pub fn init(&mut self, graph: ResolvedGraph) -> u64 {
        self.generation += 1;
        self.latest = None;
        let generation = self.generation;
        self.send(Command::Init { generation, graph });
        generation
    }

    pub fn pin(&mut self, id: &str, position: Vec2) {
        self.send(Command::Pin {
            id: id.to_owned(),
            position,
        });
    }

    pub fn release(&mut self, id: &str) {
        self.send(Command::Release { id: id.to_owned() });
    }

    fn send(&mut self, command: Command) {
        let Some(commands) = &self.commands else {
            return;
        };
        if commands.send(command).is_err() {
            warn!("layout worker is gone; further commands are ignored");
            self.commands = None;
        }
    }

    pub fn poll(&mut self) -> bool {
        let Some(ticks) = &self.ticks else {
            return false;
        };

        let mut pending = Vec::new();
        let mut disconnected = false;
        loop {
            match ticks.try_recv() {
                Ok(tick) => pending.push(tick),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            warn!("layout worker disconnected; keeping last snapshot");
            self.ticks = None;
            self.commands = None;
        }

        let stale = pending.len();
        match newest_current(pending, self.generation) {
            Some(tick) => {
                if stale > 1 {
                    debug!(skipped = stale - 1, "dropped superseded ticks");
                }
                self.latest = Some(tick.snapshot);
                true
            }
            None => false,
        }
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(Command::Shutdown);
        }
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            error!("layout worker panicked");
        }
    }
}

struct Worker {
    engine: LayoutEngine,
    warmup_steps: usize,
    generation: u64,
    ticks: Sender<Tick>,
    waker: Waker,
    step_interval: Duration,
    next_step: Instant,
}

impl Worker {
    fn run(mut self, commands: Receiver<Command>) {
        loop {
            // At rest there is nothing to step: block until perturbed.
            let command = if self.engine.is_at_rest() {
                match commands.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                }
            } else {
                let wait = self.next_step.saturating_duration_since(Instant::now());
                match commands.recv_timeout(wait) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            };

            if let Some(command) = command
                && self.apply(command).is_break()
            {
                break;
            }

            if !self.engine.is_at_rest()
                && Instant::now() >= self.next_step
                && self.step().is_break()
            {
                break;
            }
        }
        debug!("layout worker stopped");
    }

    fn apply(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Init { generation, graph } => {
                self.generation = generation;
                self.engine.init(&graph);
                self.engine.warm_up(self.warmup_steps);
                debug!(
                    generation,
                    nodes = self.engine.node_count(),
                    alpha = self.engine.alpha(),
                    "layout generation started"
                );
                self.next_step = Instant::now() + self.step_interval;
                // The first snapshot goes out even if warm-up already
                // reached rest.
                self.send(self.engine.snapshot())
            }
            Command::Pin { id, position } => {
                if self.engine.is_at_rest() {
                    self.next_step = Instant::now();
                }
                if !self.engine.pin(&id, position) {
                    debug!(%id, "pin for unknown node ignored");
                }
                ControlFlow::Continue(())
            }
            Command::Release { id } => {
                if !self.engine.release(&id) {
                    debug!(%id, "release for unknown node ignored");
                }
                ControlFlow::Continue(())
            }
            Command::Shutdown => ControlFlow::Break(()),
        }
    }

    fn step(&mut self) -> ControlFlow<()> {
        self.next_step = Instant::now() + self.step_interval;
        match self.engine.step() {
            Some(snapshot) => self.send(snapshot),
            None => ControlFlow::Continue(()),
        }
    }

    fn send(&self, snapshot: Snapshot) -> ControlFlow<()> {
        let tick = Tick {
            generation: self.generation,
            snapshot,
        };
        if self.ticks.send(tick).is_err() {
            return ControlFlow::Break(());
        }
        (self.waker)();
        ControlFlow::Continue(())
    }
}
