//! Scripted collaborators for tests and the CLI's simulation mode.
//!
//! - [`ScriptedInput`] replays knob turns and button presses. Its paired
//!   [`ScriptClock`] applies one scripted action per `sleep`, so a
//!   selection loop sees exactly one input change per tick. An exhausted
//!   script raises select and stop on every tick so loops always finish,
//!   and raises the abort flag when one is attached.
//! - [`RecordingRenderer`] keeps every drawing call.
//! - [`ScriptedShell`] answers commands from rules and a canned network.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tm_traits::{BoxError, Clock, InputSource, Point, Rect, Renderer, Shell, Signal, Tone};
use tracing::{debug, warn};

use crate::charset::CharSet;
use crate::net::{IP_CMD, LINK_CMD, MAC_CMD, RELOAD_CMD};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Input ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Relative knob movement, clamped to the current bounds.
    Turn(i32),
    /// Absolute knob position, clamped to the current bounds.
    Steps(i32),
    Press(Signal),
    /// A button that only cuts a wait short.
    Wake,
    /// Nothing happens this tick.
    Idle,
}

impl Action {
    /// Select each character of `text` in `set`, in order. Characters not in
    /// the set are skipped.
    pub fn typing(set: &CharSet, text: &str) -> Vec<Action> {
        let mut out = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            match set.position(c).and_then(|p| i32::try_from(p).ok()) {
                Some(p) => {
                    out.push(Action::Steps(p));
                    out.push(Action::Press(Signal::Select));
                }
                None => debug!(?c, "not in character set, skipped"),
            }
        }
        out
    }

    /// Parse a whitespace or comma separated script.
    ///
    /// Tokens: `+N`/`-N` turn, `@N` absolute position, `select`/`s`,
    /// `stop`/`x`, `rewind`/`r`, `wake`/`w`, `idle`/`.`, and `type:TEXT`
    /// (printable set). Any token may end in `*N` to repeat it.
    pub fn parse_script(script: &str) -> eyre::Result<Vec<Action>> {
        let mut out = Vec::new();
        for raw in script
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            let (tok, times) = match raw.rsplit_once('*') {
                Some((t, n)) if !t.is_empty() => {
                    let n: usize = n
                        .parse()
                        .map_err(|_| eyre::eyre!("bad repeat count in {raw:?}"))?;
                    (t, n)
                }
                _ => (raw, 1),
            };
            let actions = match tok {
                "select" | "s" => vec![Action::Press(Signal::Select)],
                "stop" | "x" => vec![Action::Press(Signal::Stop)],
                "rewind" | "r" => vec![Action::Press(Signal::Rewind)],
                "wake" | "w" => vec![Action::Wake],
                "idle" | "." => vec![Action::Idle],
                t if t.starts_with("type:") => {
                    Action::typing(&CharSet::printable(), &t["type:".len()..])
                }
                t if t.starts_with('@') => {
                    let n = t[1..]
                        .parse()
                        .map_err(|_| eyre::eyre!("bad position in {raw:?}"))?;
                    vec![Action::Steps(n)]
                }
                t if t.starts_with('+') || t.starts_with('-') => {
                    let n = t
                        .parse()
                        .map_err(|_| eyre::eyre!("bad turn in {raw:?}"))?;
                    vec![Action::Turn(n)]
                }
                _ => eyre::bail!("unknown script token {raw:?}"),
            };
            for _ in 0..times {
                out.extend_from_slice(&actions);
            }
        }
        Ok(out)
    }
}

#[derive(Debug)]
struct ScriptState {
    steps: i32,
    bounds: (i32, i32),
    flags: [bool; 3],
    actions: VecDeque<Action>,
    exhausted: bool,
    elapsed: Duration,
    abort: Option<Arc<AtomicBool>>,
}

impl ScriptState {
    fn clamp(&self, v: i32) -> i32 {
        v.clamp(self.bounds.0, self.bounds.1.max(self.bounds.0))
    }

    fn apply_next(&mut self) {
        match self.actions.pop_front() {
            Some(Action::Turn(d)) => self.steps = self.clamp(self.steps.saturating_add(d)),
            Some(Action::Steps(n)) => self.steps = self.clamp(n),
            Some(Action::Press(s)) => self.flags[s.index()] = true,
            Some(Action::Wake | Action::Idle) => {}
            None => {
                if !self.exhausted {
                    warn!("input script exhausted");
                    self.exhausted = true;
                }
                self.flags[Signal::Select.index()] = true;
                self.flags[Signal::Stop.index()] = true;
                if let Some(flag) = &self.abort {
                    flag.store(true, Ordering::Release);
                }
            }
        }
    }
}

/// Knob and buttons driven by a list of [`Action`]s.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    state: Arc<Mutex<ScriptState>>,
    origin: Instant,
}

impl ScriptedInput {
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                steps: 0,
                bounds: (i32::MIN, i32::MAX),
                flags: [false; 3],
                actions: actions.into_iter().collect(),
                exhausted: false,
                elapsed: Duration::ZERO,
                abort: None,
            })),
            origin: Instant::now(),
        }
    }

    /// Raise `flag` once the script runs out, ending any loop that checks it.
    #[must_use]
    pub fn abort_when_exhausted(self, flag: Arc<AtomicBool>) -> Self {
        lock(&self.state).abort = Some(flag);
        self
    }

    /// Clock that advances this script by one action per `sleep`.
    pub fn clock(&self) -> ScriptClock {
        ScriptClock {
            input: self.clone(),
        }
    }

    /// Actions not yet replayed.
    pub fn remaining(&self) -> usize {
        lock(&self.state).actions.len()
    }

    /// Raise a signal from outside the script (e.g. Ctrl-C).
    pub fn press(&self, signal: Signal) {
        lock(&self.state).flags[signal.index()] = true;
    }

    pub fn bounds(&self) -> (i32, i32) {
        lock(&self.state).bounds
    }
}

impl InputSource for ScriptedInput {
    fn steps(&self) -> i32 {
        lock(&self.state).steps
    }

    fn reset(&self, bounds: (i32, i32)) {
        let mut s = lock(&self.state);
        s.bounds = bounds;
        s.steps = 0;
    }

    fn is_set(&self, signal: Signal) -> bool {
        lock(&self.state).flags[signal.index()]
    }

    fn clear(&self, signal: Signal) {
        lock(&self.state).flags[signal.index()] = false;
    }

    /// Consumes a leading [`Action::Wake`]; otherwise the full timeout
    /// passes in simulated time.
    fn wait_for_press(&self, timeout: Duration) -> bool {
        let mut s = lock(&self.state);
        if s.actions.front() == Some(&Action::Wake) {
            s.actions.pop_front();
            return true;
        }
        s.elapsed = s.elapsed.saturating_add(timeout);
        false
    }
}

/// Simulated time paired with a [`ScriptedInput`].
#[derive(Debug, Clone)]
pub struct ScriptClock {
    input: ScriptedInput,
}

impl Clock for ScriptClock {
    fn now(&self) -> Instant {
        self.input.origin + lock(&self.input.state).elapsed
    }

    fn sleep(&self, d: Duration) {
        let mut s = lock(&self.input.state);
        s.elapsed = s.elapsed.saturating_add(d);
        s.apply_next();
    }
}

// ── Renderer ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOp {
    Clear,
    ClearArea(Rect),
    Text { text: String, at: Point, tone: Tone },
    Flush,
}

/// Shared view of everything a [`RecordingRenderer`] was asked to draw.
#[derive(Debug, Clone, Default)]
pub struct DrawLog(Arc<Mutex<Vec<DrawOp>>>);

impl DrawLog {
    pub fn ops(&self) -> Vec<DrawOp> {
        lock(&self.0).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        lock(&self.0)
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn highlighted(&self) -> Vec<String> {
        lock(&self.0)
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text {
                    text,
                    tone: Tone::Highlight,
                    ..
                } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    fn push(&self, op: DrawOp) {
        lock(&self.0).push(op);
    }
}

/// A 160x128 panel with a 6x10 px monospace font that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    log: DrawLog,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> DrawLog {
        self.log.clone()
    }
}

impl Renderer for RecordingRenderer {
    fn bounds(&self) -> Rect {
        Rect::new(0, 0, 160, 128)
    }

    fn line_height(&self) -> i32 {
        10
    }

    fn text_width(&self, text: &str) -> i32 {
        let widest = text.split('\n').map(|l| l.chars().count()).max().unwrap_or(0);
        i32::try_from(widest).unwrap_or(i32::MAX).saturating_mul(6)
    }

    fn clear(&mut self) -> Result<(), BoxError> {
        self.log.push(DrawOp::Clear);
        self.log.push(DrawOp::Flush);
        Ok(())
    }

    fn clear_area(&mut self, area: Rect, flush: bool) -> Result<(), BoxError> {
        self.log.push(DrawOp::ClearArea(area));
        if flush {
            self.log.push(DrawOp::Flush);
        }
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        tone: Tone,
        flush: bool,
    ) -> Result<(), BoxError> {
        self.log.push(DrawOp::Text {
            text: text.to_string(),
            at,
            tone,
        });
        if flush {
            self.log.push(DrawOp::Flush);
        }
        Ok(())
    }
}

// ── Shell ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Out(String),
    /// Non-zero exit with this code.
    Fail(i32),
}

/// Canned wireless environment for [`ScriptedShell::simulated_network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimNet {
    Online,
    Offline,
    /// Offline until the supplicant is told to reload.
    JoinAfterReload,
}

#[derive(Debug)]
struct NetSim {
    online: AtomicBool,
    join_on_reload: bool,
}

/// Shared view of the commands a [`ScriptedShell`] received.
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<String>>>);

impl CommandLog {
    pub fn commands(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        lock(&self.0).iter().filter(|c| c.contains(needle)).count()
    }
}

/// Shell whose answers come from substring rules, then from an optional
/// simulated network. Anything else prints nothing and succeeds.
#[derive(Debug, Default)]
pub struct ScriptedShell {
    rules: Vec<(String, VecDeque<Reply>)>,
    net: Option<NetSim>,
    log: CommandLog,
}

pub const SIM_SCAN: &str = concat!(
    "          ESSID:\"HomeNet\"\n",
    "          ESSID:\"Neighbor\"\n",
    "          ESSID:\"\"\n",
);
pub const SIM_IP: &str = "192.168.1.23";
pub const SIM_MAC: &str = "b8:27:eb:12:34:56";

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simulated_network(net: SimNet) -> Self {
        Self {
            net: Some(NetSim {
                online: AtomicBool::new(net == SimNet::Online),
                join_on_reload: net == SimNet::JoinAfterReload,
            }),
            ..Self::default()
        }
    }

    /// Reply to commands containing `needle`. Replies queue up; the last one
    /// repeats.
    #[must_use]
    pub fn on(mut self, needle: &str, reply: Reply) -> Self {
        match self.rules.iter_mut().find(|(n, _)| n == needle) {
            Some((_, q)) => q.push_back(reply),
            None => self.rules.push((needle.to_string(), VecDeque::from([reply]))),
        }
        self
    }

    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    fn reply(&mut self, cmd: &str) -> Reply {
        lock(&self.log.0).push(cmd.to_string());
        if let Some((_, q)) = self.rules.iter_mut().find(|(n, _)| cmd.contains(n.as_str())) {
            let r = if q.len() > 1 { q.pop_front() } else { q.front().cloned() };
            if let Some(r) = r {
                return r;
            }
        }
        let Some(net) = &self.net else {
            return Reply::Out(String::new());
        };
        let online = net.online.load(Ordering::Relaxed);
        if cmd.contains("iwlist") {
            Reply::Out(SIM_SCAN.to_string())
        } else if cmd.contains(LINK_CMD) {
            let essid = if online { "ESSID:\"HomeNet\"" } else { "ESSID:off/any" };
            Reply::Out(format!("wlan0     IEEE 802.11  {essid}  \n          Mode:Managed\n"))
        } else if cmd.contains(IP_CMD) {
            Reply::Out(if online { format!("{SIM_IP} fd00::23 \n") } else { "\n".into() })
        } else if cmd.contains(MAC_CMD) {
            Reply::Out(format!("{SIM_MAC}\n"))
        } else {
            if cmd.contains(RELOAD_CMD) && net.join_on_reload {
                net.online.store(true, Ordering::Relaxed);
            }
            Reply::Out(String::new())
        }
    }
}

impl Shell for ScriptedShell {
    fn output(&mut self, cmd: &str) -> Result<String, BoxError> {
        match self.reply(cmd) {
            Reply::Out(s) => Ok(s),
            Reply::Fail(code) => Err(Box::new(std::io::Error::other(format!(
                "`{cmd}` exited with status {code}"
            )))),
        }
    }

    fn status(&mut self, cmd: &str) -> Result<bool, BoxError> {
        Ok(matches!(self.reply(cmd), Reply::Out(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_script_tokens() {
        let a = Action::parse_script("+2, -1 @5 s x r w . +1*3").unwrap();
        assert_eq!(
            a,
            vec![
                Action::Turn(2),
                Action::Turn(-1),
                Action::Steps(5),
                Action::Press(Signal::Select),
                Action::Press(Signal::Stop),
                Action::Press(Signal::Rewind),
                Action::Wake,
                Action::Idle,
                Action::Turn(1),
                Action::Turn(1),
                Action::Turn(1),
            ]
        );
        assert!(Action::parse_script("jump").is_err());
        assert!(Action::parse_script("s*x").is_err());
    }

    #[test]
    fn typing_maps_characters_to_positions() {
        let a = Action::parse_script("type:a1").unwrap();
        assert_eq!(
            a,
            vec![
                Action::Steps(10),
                Action::Press(Signal::Select),
                Action::Steps(1),
                Action::Press(Signal::Select),
            ]
        );
    }

    #[test]
    fn clock_applies_one_action_per_sleep() {
        let input = ScriptedInput::new([Action::Turn(3), Action::Press(Signal::Select)]);
        let clock = input.clock();
        input.reset((-1, 2));
        clock.sleep(Duration::from_millis(10));
        assert_eq!(input.steps(), 2);
        assert!(!input.is_set(Signal::Select));
        clock.sleep(Duration::from_millis(10));
        assert!(input.is_set(Signal::Select));
        assert_eq!(input.remaining(), 0);
        input.clear_all();
        clock.sleep(Duration::from_millis(10));
        assert!(input.is_set(Signal::Select) && input.is_set(Signal::Stop));
    }

    #[test]
    fn waits_only_consume_wake() {
        let input = ScriptedInput::new([Action::Press(Signal::Select), Action::Wake]);
        let clock = input.clock();
        let t0 = clock.now();
        assert!(!input.wait_for_press(Duration::from_secs(1)));
        assert_eq!(clock.elapsed_since(t0), Duration::from_secs(1));
        clock.sleep(Duration::ZERO);
        assert!(input.wait_for_press(Duration::from_secs(1)));
    }

    #[test]
    fn scripted_shell_rules_then_network() {
        let mut sh = ScriptedShell::simulated_network(SimNet::JoinAfterReload)
            .on("hostname", Reply::Fail(1))
            .on("hostname", Reply::Out("10.0.0.9\n".into()));
        assert!(sh.output("hostname -I").is_err());
        assert_eq!(sh.output("hostname -I").unwrap(), "10.0.0.9\n");
        assert_eq!(sh.output("hostname -I").unwrap(), "10.0.0.9\n");
        assert!(sh.output(LINK_CMD).unwrap().contains("off/any"));
        assert!(sh.status(RELOAD_CMD).unwrap());
        assert!(sh.output(LINK_CMD).unwrap().contains("HomeNet"));
        assert_eq!(sh.log().count("hostname"), 3);
    }
}
