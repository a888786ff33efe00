//! Text commands over the public [`Sim`] operations.
//!
//! | Command                     | Effect                                       |
//! |-----------------------------|----------------------------------------------|
//! | `help`                      | lists every command with its description     |
//! | `starthorde [secs|forever]` | starts a horde (default length from config)  |
//! | `wipe [ai|players]`         | lethal damage to a whole faction             |
//! | `spawn [n]`                 | `n` spawns at each spawner of occupied rooms |
//! | `partitions`                | toggles partition logging at snapshots       |
//! | `aistats`                   | the population report                        |
//! | `killaura`                  | toggles the kill aura                        |
//! | `reset`                     | back to the initial level                    |
//!
//! Names are case-insensitive and may be abbreviated to any unique prefix.
//! Nothing in the simulation depends on a console existing.

use std::collections::BTreeMap;

use tracing::{info, warn};

use hz_core::Faction;
use hz_spatial::HordeDuration;

use crate::{Sim, SimError, SimResult};

pub type CommandFn = fn(&Console, &mut Sim, &[&str]) -> SimResult<String>;

#[derive(Copy, Clone)]
pub struct Command {
    pub name:        &'static str,
    pub description: &'static str,
    pub run:         CommandFn,
}

pub struct Console {
    commands: BTreeMap<&'static str, Command>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// A console with every built-in command.
    pub fn new() -> Self {
        let mut console = Self::empty();
        for command in BUILTINS {
            console.register(*command);
        }
        console
    }

    pub fn empty() -> Self {
        Self { commands: BTreeMap::new() }
    }

    /// Add or replace a command.  Names are stored as given and must be
    /// lowercase to be reachable.
    pub fn register(&mut self, command: Command) {
        self.commands.insert(command.name, command);
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> + '_ {
        self.commands.values()
    }

    /// Every command name starting with `prefix`, sorted.
    pub fn complete(&self, prefix: &str) -> Vec<&'static str> {
        let prefix = prefix.to_lowercase();
        self.commands
            .range::<str, _>((std::ops::Bound::Included(prefix.as_str()), std::ops::Bound::Unbounded))
            .take_while(|(name, _)| name.starts_with(prefix.as_str()))
            .map(|(&name, _)| name)
            .collect()
    }

    /// The command called `name`, or the only one it is a prefix of.
    pub fn resolve(&self, name: &str) -> SimResult<&Command> {
        let name = name.to_lowercase();
        if let Some(command) = self.commands.get(name.as_str()) {
            return Ok(command);
        }
        match self.complete(&name).as_slice() {
            [only] => self
                .commands
                .get(only)
                .ok_or_else(|| SimError::Command(format!("unknown command '{name}'"))),
            [] => Err(SimError::Command(format!("unknown command '{name}'"))),
            many => Err(SimError::Command(format!("'{name}' is ambiguous: {}", many.join(", ")))),
        }
    }

    /// Parse and run one line.  Returns the command's output text.
    pub fn execute(&self, sim: &mut Sim, line: &str) -> SimResult<String> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(SimError::Command("empty command".into()));
        };
        let args: Vec<&str> = words.collect();
        let command = match self.resolve(name) {
            Ok(command) => command,
            Err(e) => {
                warn!(line, "invalid command");
                return Err(e);
            }
        };
        let output = (command.run)(self, sim, &args)?;
        info!(command = command.name, "{output}");
        Ok(output)
    }

    pub fn help(&self) -> String {
        self.commands
            .values()
            .map(|c| format!("{} - {}", c.name, c.description))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── Built-ins ─────────────────────────────────────────────────────────────────

const BUILTINS: &[Command] = &[
    Command { name: "help", description: "List every command", run: help },
    Command {
        name:        "starthorde",
        description: "Start a horde for the given seconds, or forever",
        run:         start_horde,
    },
    Command { name: "wipe", description: "Kill every zombie (ai) or every survivor (players)", run: wipe },
    Command { name: "spawn", description: "Queue n spawns at each spawner of every occupied partition", run: spawn },
    Command { name: "partitions", description: "Toggle partition logging", run: partitions },
    Command { name: "aistats", description: "Show the population report", run: ai_stats },
    Command { name: "killaura", description: "Toggle killing zombies near the player", run: kill_aura },
    Command { name: "reset", description: "Reload the level", run: reset },
];

fn help(console: &Console, _sim: &mut Sim, _args: &[&str]) -> SimResult<String> {
    Ok(console.help())
}

fn start_horde(_: &Console, sim: &mut Sim, args: &[&str]) -> SimResult<String> {
    let duration = match args.first() {
        None => HordeDuration::Secs(sim.ctx.horde.config.default_horde_secs),
        Some(arg) if arg.eq_ignore_ascii_case("forever") => HordeDuration::Forever,
        Some(arg) => match arg.parse::<f32>() {
            Ok(secs) if secs > 0.0 => HordeDuration::Secs(secs),
            _ => return Err(SimError::Command(format!("starthorde: bad duration '{arg}'"))),
        },
    };
    let assigned = sim.instigate_horde(duration)?;
    Ok(match duration {
        HordeDuration::Forever => format!("Horde started indefinitely, {assigned} zombies hunting"),
        HordeDuration::Secs(secs) => format!("Horde started for {secs} seconds, {assigned} zombies hunting"),
    })
}

fn wipe(_: &Console, sim: &mut Sim, args: &[&str]) -> SimResult<String> {
    let faction = match args.first().map(|a| a.to_lowercase()).as_deref() {
        None | Some("ai") => Faction::Horde,
        Some("players") => Faction::Survivor,
        Some(other) => return Err(SimError::Command(format!("wipe: expected 'ai' or 'players', got '{other}'"))),
    };
    let count = sim.wipe(faction);
    Ok(format!("Wiped {count} {}", faction.name()))
}

fn spawn(_: &Console, sim: &mut Sim, args: &[&str]) -> SimResult<String> {
    let per_spawner = match args.first() {
        None => 1,
        Some(arg) => arg
            .parse::<usize>()
            .map_err(|_| SimError::Command(format!("spawn: bad count '{arg}'")))?,
    };
    let queued = sim.spawn_near_survivors(per_spawner);
    Ok(format!("Queued {queued} spawns"))
}

fn partitions(_: &Console, sim: &mut Sim, _args: &[&str]) -> SimResult<String> {
    let on = sim.toggle_partition_overlay();
    Ok(format!("Partition overlay {}", if on { "on" } else { "off" }))
}

fn ai_stats(_: &Console, sim: &mut Sim, _args: &[&str]) -> SimResult<String> {
    Ok(sim.stats().to_string())
}

fn kill_aura(_: &Console, sim: &mut Sim, _args: &[&str]) -> SimResult<String> {
    let on = sim.toggle_kill_aura();
    Ok(format!("Kill aura {}", if on { "on" } else { "off" }))
}

fn reset(_: &Console, sim: &mut Sim, _args: &[&str]) -> SimResult<String> {
    sim.reset()?;
    Ok("Level reset".to_owned())
}
