//! The bus orchestrator: one GPIO, three execution contexts.
//!
//! The io task owns the pin. In receive mode it plays the interrupt role:
//! every edge is timestamped, low/high half-periods are paired into
//! [`PulseRecord`]s and pushed wait-free into the pulse queue. The RX
//! worker drains that queue through the frame decoder and folds finalized
//! frames into the registry and the canonical state. The TX worker watches
//! the outbound queue and, when the scheduler gate opens, hands the packet
//! to the io task for bit-banged playback; while that runs the bus mode
//! reads `Transmit` and incoming edges are discarded.

use core::cell::RefCell;
use core::fmt::Write as _;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use defmt::{debug, info, trace, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::{AnyPin, Flex, Pin, Pull};
use embassy_rp::Peri;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{block_for, Duration, Instant, Timer};
use heapless::String;

use crate::call::Call;
use crate::decoder::{Decoder, FeedOutcome};
use crate::frame::{FrameKind, Registry};
use crate::packet::{Packet, Source};
use crate::pulse::{burst_duration_ms, encode_frame, spacing_after, PulseRecord};
use crate::queue::DropOldestQueue;
use crate::schedule::{TxGate, TxHold};
use crate::shared_constants::{
    HEATER_OFFLINE_MS, PULSE_QUEUE_LEN, RX_POP_TIMEOUT_MS, STATUS_MOMENTARY_MS, TRANSMIT_COUNT,
    TX_QUEUE_LEN, TX_STARTUP_DELAY_MS, TX_TICK_MS,
};
use crate::state::{HeatPumpState, Traits};
use crate::status::HeaterStatus;
use crate::{Error, Result};

/// Whether the wire is being listened to or driven.
#[derive(Copy, Clone, Debug, PartialEq, Eq, defmt::Format)]
pub enum BusMode {
    /// Listening; edges feed the decoder.
    Receive,
    /// Driving a burst; edges are our own and are discarded.
    Transmit,
    /// The driver detected an illegal pin state.
    Error,
}

const MODE_RECEIVE: u8 = 0;
const MODE_TRANSMIT: u8 = 1;
const MODE_ERROR: u8 = 2;

/// One status line, momentary warnings and errors layered on top.
struct Status {
    line: String<64>,
    momentary: Option<(String<64>, u64)>,
}

impl Status {
    const fn new() -> Self {
        Self {
            line: String::new(),
            momentary: None,
        }
    }

    fn set_line(&mut self, text: &str) {
        self.line.clear();
        let _ = self.line.push_str(text);
    }

    fn set_momentary(&mut self, text: &str, now_ms: u64) {
        let mut line = String::new();
        let _ = line.push_str(text);
        self.momentary = Some((line, now_ms + STATUS_MOMENTARY_MS));
    }

    fn expire(&mut self, now_ms: u64) {
        if let Some((_, until)) = &self.momentary {
            if *until <= now_ms {
                self.momentary = None;
            }
        }
    }

    fn current(&self) -> &str {
        match &self.momentary {
            Some((line, _)) => line.as_str(),
            None => self.line.as_str(),
        }
    }
}

struct Shared {
    state: HeatPumpState,
    registry: Registry,
    gate: TxGate,
    status: Status,
    heater_status: HeaterStatus,
}

/// Static storage shared between the bus handle and its three tasks.
///
/// Create one with [`NetBus::new_static`] and keep it in a `static`.
pub struct BusStatics {
    pulse_q: DropOldestQueue<PulseRecord, PULSE_QUEUE_LEN>,
    tx_q: DropOldestQueue<Packet, TX_QUEUE_LEN>,
    tx_request: Channel<CriticalSectionRawMutex, Packet, 1>,
    tx_done: Signal<CriticalSectionRawMutex, ()>,
    mode: AtomicU8,
    receiving: AtomicBool,
    passive: AtomicBool,
    update_active: AtomicBool,
    shared: Mutex<CriticalSectionRawMutex, RefCell<Shared>>,
}

impl BusStatics {
    fn mode(&self) -> BusMode {
        match self.mode.load(Ordering::Relaxed) {
            MODE_TRANSMIT => BusMode::Transmit,
            MODE_ERROR => BusMode::Error,
            _ => BusMode::Receive,
        }
    }

    fn set_mode(&self, mode: BusMode) {
        let raw = match mode {
            BusMode::Receive => MODE_RECEIVE,
            BusMode::Transmit => MODE_TRANSMIT,
            BusMode::Error => MODE_ERROR,
        };
        self.mode.store(raw, Ordering::Relaxed);
    }
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

/// Handle to a running NET-port bus.
///
/// # Examples
/// ```no_run
/// # #![no_std]
/// # #![no_main]
/// # use embassy_executor::Spawner;
/// # async fn example(p: embassy_rp::Peripherals, spawner: Spawner) -> hayward_netbus::Result<()> {
/// use hayward_netbus::{BusStatics, Call, FanMode, NetBus};
///
/// static BUS_STATICS: BusStatics = NetBus::new_static();
/// let bus = NetBus::new(p.PIN_14, &BUS_STATICS, spawner)?;
///
/// // Observe only until explicitly armed.
/// let state = bus.poll();
///
/// bus.set_passive_mode(false);
/// bus.control(&Call::new().fan_mode(FanMode::Scheduled))?;
/// # Ok(())
/// # }
/// ```
pub struct NetBus<'a> {
    statics: &'a BusStatics,
}

impl NetBus<'_> {
    /// Creates the static storage for one bus.
    #[must_use]
    pub const fn new_static() -> BusStatics {
        BusStatics {
            pulse_q: DropOldestQueue::new(),
            tx_q: DropOldestQueue::new(),
            tx_request: Channel::new(),
            tx_done: Signal::new(),
            mode: AtomicU8::new(MODE_RECEIVE),
            receiving: AtomicBool::new(false),
            passive: AtomicBool::new(true),
            update_active: AtomicBool::new(false),
            shared: Mutex::new(RefCell::new(Shared {
                state: HeatPumpState::new(),
                registry: Registry::new(),
                gate: TxGate::new(),
                status: Status::new(),
                heater_status: HeaterStatus::new(),
            })),
        }
    }

    /// Wires the pin and starts the io/RX/TX tasks. The bus comes up in
    /// receive mode with passive mode on.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the background tasks cannot be spawned.
    pub fn new<P: Pin>(
        pin: Peri<'static, P>,
        statics: &'static BusStatics,
        spawner: Spawner,
    ) -> Result<Self> {
        let any: Peri<'static, AnyPin> = pin.into();
        let mut flex = Flex::new(any);
        flex.set_as_input();
        flex.set_pull(Pull::Up);

        statics.shared.lock(|cell| {
            cell.borrow_mut().status.set_line("Ready");
        });

        spawner.spawn(io_task(flex, statics)).map_err(Error::TaskSpawn)?;
        spawner.spawn(rx_task(statics)).map_err(Error::TaskSpawn)?;
        spawner.spawn(tx_task(statics)).map_err(Error::TaskSpawn)?;
        info!("NET bus started");
        Ok(Self { statics })
    }

    /// Snapshots the canonical state for downstream consumers.
    ///
    /// Also refreshes the status line: expires momentary messages, flags a
    /// bus error, and reports the heater offline when no heater frame
    /// arrived for 30 s. A powered-off mode forces the action to off.
    #[must_use]
    pub fn poll(&self) -> HeatPumpState {
        let now = now_ms();
        let mode = self.statics.mode();
        self.statics.shared.lock(|cell| {
            let shared = &mut *cell.borrow_mut();
            shared.status.expire(now);
            if mode == BusMode::Error {
                shared.status.set_momentary("Bus error", now);
            }
            let offline = shared
                .state
                .last_heater_frame
                .is_none_or(|last| last + HEATER_OFFLINE_MS < now);
            shared
                .status
                .set_line(if offline { "Waiting for heater" } else { "Connected to heater" });

            let mut snapshot = shared.state;
            if snapshot.mode == Some(crate::codec::ClimateMode::Off) {
                snapshot.action = Some(crate::codec::ClimateAction::Off);
            }
            snapshot
        })
    }

    /// Applies a user change request.
    ///
    /// Walks the frame catalog in order; every specialized frame that owns
    /// a touched field clones its last observed payload, applies the delta
    /// and enqueues the result. In passive mode nothing is enqueued and a
    /// momentary warning is surfaced instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetTemperatureOutOfRange`] when the requested
    /// target lies outside the window the heat pump advertises; the call is
    /// rejected as a whole.
    pub fn control(&self, call: &Call) -> Result<()> {
        let now = now_ms();
        let statics = self.statics;
        let validation = statics.shared.lock(|cell| {
            let shared = &mut *cell.borrow_mut();
            let result = call.validate(&shared.state);
            if result.is_err() {
                shared.status.set_momentary("Invalid target temperature", now);
            }
            result
        });
        validation?;

        if statics.passive.load(Ordering::Relaxed) {
            warn!("Passive mode. Ignoring inbound changes");
            statics.shared.lock(|cell| {
                cell.borrow_mut()
                    .status
                    .set_momentary("Passive mode. Ignoring changes", now);
            });
            return Ok(());
        }

        let result = statics
            .shared
            .lock(|cell| cell.borrow().registry.control(call));
        if result.awaiting_data {
            warn!("Cannot control yet. Waiting for initial heater state");
            statics.shared.lock(|cell| {
                cell.borrow_mut()
                    .status
                    .set_momentary("Waiting for initial heater state", now);
            });
        }
        for packet in &result.packets {
            debug!("Queueing control frame 0x{=u8:02X}", packet.type_id());
            if !statics.tx_q.push(*packet) {
                warn!("Outbound queue overflow, oldest command dropped");
                statics.shared.lock(|cell| {
                    cell.borrow_mut()
                        .status
                        .set_momentary("Control queue overflow", now);
                });
            }
        }
        Ok(())
    }

    /// Suppress all transmissions. On by default.
    pub fn set_passive_mode(&self, passive: bool) {
        self.statics.passive.store(passive, Ordering::Relaxed);
        debug!("Passive mode: {}", passive);
    }

    /// Whether transmissions are suppressed.
    #[must_use]
    pub fn passive_mode(&self) -> bool {
        self.statics.passive.load(Ordering::Relaxed)
    }

    /// Gate for downstream mirroring; the driver itself only stores it.
    pub fn set_update_active(&self, active: bool) {
        self.statics.update_active.store(active, Ordering::Relaxed);
        debug!("Update active: {}", active);
    }

    /// Whether downstream mirroring is enabled.
    #[must_use]
    pub fn update_active(&self) -> bool {
        self.statics.update_active.load(Ordering::Relaxed)
    }

    /// The current bus mode.
    #[must_use]
    pub fn mode(&self) -> BusMode {
        self.statics.mode()
    }

    /// The current status line (momentary messages take precedence).
    #[must_use]
    pub fn status(&self) -> String<64> {
        self.statics.shared.lock(|cell| {
            let mut line = String::new();
            let _ = line.push_str(cell.borrow().status.current());
            line
        })
    }

    /// The heater's error-code entry.
    #[must_use]
    pub fn heater_status(&self) -> HeaterStatus {
        self.statics.shared.lock(|cell| cell.borrow().heater_status)
    }

    /// The capability set derived from the observed configuration frames.
    #[must_use]
    pub fn traits(&self) -> Traits {
        let mut traits = Traits {
            supports_current_temperature: true,
            supports_action: true,
            ..Traits::default()
        };
        self.statics
            .shared
            .lock(|cell| cell.borrow().registry.collect_traits(&mut traits));
        traits
    }

    /// Logs every observed packet as a Rust array initializer, ready to be
    /// pasted into a capture replay.
    pub fn generate_code(&self) {
        let code = self.statics.shared.lock(|cell| {
            let mut code: String<1024> = String::new();
            let _ = cell.borrow().registry.write_code(&mut code);
            code
        });
        for line in code.lines() {
            info!("{=str}", line);
        }
    }
}

#[embassy_executor::task]
async fn io_task(mut pin: Flex<'static>, statics: &'static BusStatics) -> ! {
    let mut last_edge = Instant::now();
    let mut level_low = pin.is_low();
    let mut pending_low_us: Option<u32> = None;

    info!("NET bus io task started");
    loop {
        match select(pin.wait_for_any_edge(), statics.tx_request.receive()).await {
            Either::First(()) => {
                let now = Instant::now();
                let elapsed_us = now.duration_since(last_edge).as_micros() as u32;
                last_edge = now;
                // Every edge toggles the level; the period that just ended
                // belongs to the previous level.
                level_low = !level_low;

                if statics.mode() != BusMode::Receive {
                    continue;
                }
                if level_low {
                    // A high period just ended; pair it with its low.
                    if let Some(low_us) = pending_low_us.take() {
                        if !statics.pulse_q.push(PulseRecord {
                            low_us,
                            high_us: elapsed_us,
                        }) {
                            // Oldest record dropped; the framer will
                            // resynchronize at the next preamble.
                            trace!("Pulse queue overflow");
                        }
                    }
                } else {
                    pending_low_us = Some(elapsed_us);
                }
            }
            Either::Second(packet) => {
                statics.set_mode(BusMode::Transmit);
                pin.set_as_output();
                for repeat in 0..TRANSMIT_COUNT {
                    // One repeat is driven without yielding so no bit gets
                    // stretched by the scheduler.
                    for (low_ms, high_ms) in encode_frame(&packet) {
                        pin.set_low();
                        block_for(Duration::from_millis(u64::from(low_ms)));
                        pin.set_high();
                        block_for(Duration::from_millis(u64::from(high_ms)));
                    }
                    let (low_ms, high_ms) = spacing_after(repeat, TRANSMIT_COUNT);
                    pin.set_low();
                    block_for(Duration::from_millis(u64::from(low_ms)));
                    pin.set_high();
                    Timer::after_millis(u64::from(high_ms)).await;
                }
                pin.set_as_input();
                pin.set_pull(Pull::Up);
                level_low = pin.is_low();
                last_edge = Instant::now();
                pending_low_us = None;
                statics.set_mode(BusMode::Receive);
                statics.tx_done.signal(());
            }
        }
    }
}

#[embassy_executor::task]
async fn rx_task(statics: &'static BusStatics) -> ! {
    let mut decoder = Decoder::new();

    info!("NET bus RX worker started");
    loop {
        let record = statics
            .pulse_q
            .pop(Duration::from_millis(RX_POP_TIMEOUT_MS))
            .await;
        let outcome = match record {
            Some(record) => {
                if statics.mode() != BusMode::Receive {
                    continue;
                }
                decoder.feed(record, now_ms())
            }
            None => {
                // Queue empty past the idle threshold with a frame still
                // open: the bus went quiet, close the frame.
                if !decoder.is_receiving() {
                    continue;
                }
                decoder.on_idle_timeout(now_ms())
            }
        };
        statics
            .receiving
            .store(decoder.is_receiving(), Ordering::Relaxed);

        match outcome {
            FeedOutcome::Pending => {}
            FeedOutcome::Discarded(reason) => {
                debug!("Frame discarded: {}", defmt::Debug2Format(&reason));
            }
            FeedOutcome::Frame(frame) => handle_frame(statics, &frame),
        }
    }
}

fn handle_frame(statics: &BusStatics, frame: &crate::decoder::DecodedFrame) {
    let (accepted, line) = statics.shared.lock(|cell| {
        let shared = &mut *cell.borrow_mut();
        let accepted = shared.registry.accept(frame, &mut shared.state);
        if frame.source == Source::Controller {
            shared.gate.note_controller_frame(frame.frame_time_ms);
        }
        let mut line: String<256> = String::new();
        if accepted.changed || accepted.first {
            let prefix = if accepted.first { "New" } else { "Chg" };
            if let Some(entry) = shared.registry.entry(accepted.kind) {
                let _ = entry.write_line(prefix, frame.frame_time_ms, &mut line);
            }
        }
        (accepted, line)
    });

    if line.is_empty() {
        trace!(
            "Same frame 0x{=u8:02X} ({=str})",
            frame.packet.type_id(),
            frame.source.tag()
        );
    } else {
        info!("{=str}", line.as_str());
    }
    if let FrameKind::Unknown(signature) = accepted.kind {
        if accepted.first {
            debug!("Registered pass-through entry for type 0x{=u8:02X}", signature);
        }
    }
}

#[embassy_executor::task]
async fn tx_task(statics: &'static BusStatics) -> ! {
    info!("NET bus TX worker started");
    Timer::after_millis(TX_STARTUP_DELAY_MS).await;
    loop {
        Timer::after_millis(TX_TICK_MS).await;
        if statics.tx_q.is_empty() {
            continue;
        }

        let now = now_ms();
        let receiving = statics.receiving.load(Ordering::Relaxed);
        // Gate on the worst case: every bit of every repeat long.
        let burst_ms =
            crate::shared_constants::SINGLE_FRAME_MAX_DURATION_MS * u64::from(TRANSMIT_COUNT);
        let gate = statics.shared.lock(|cell| cell.borrow().gate);
        match gate.clear_to_send(now, receiving, burst_ms) {
            Ok(()) => {}
            Err(TxHold::Receiving) => {
                trace!("Packet being received, waiting");
                continue;
            }
            Err(TxHold::Throttled) => {
                debug!("Throttling outbound frame");
                continue;
            }
            Err(TxHold::ControllerWindow) => {
                warn!("No time to send before next keypad frame, waiting");
                continue;
            }
        }

        let Some(packet) = statics.tx_q.try_pop() else {
            continue;
        };
        let mut line: String<64> = String::new();
        let _ = write!(
            line,
            "SEND  0x{:02X} ({} repeats, ~{}ms)",
            packet.type_id(),
            TRANSMIT_COUNT,
            burst_duration_ms(&packet, TRANSMIT_COUNT)
        );
        info!("{=str}", line.as_str());

        statics.tx_request.send(packet).await;
        statics.tx_done.wait().await;
        statics.shared.lock(|cell| {
            cell.borrow_mut().gate.note_transmit(now_ms());
        });
    }
}
