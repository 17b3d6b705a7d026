//! Command parsing and dispatch
//!
//! A decoded request array becomes a [`Command`]; [`Store::execute`] matches
//! on the uppercased name, validates arity, mutates one of the three typed
//! stores and returns the reply frame. Argument problems never escape as
//! errors: they are answered in-band as `-…` frames and the connection stays
//! open.

use minnow_core::resp::Frame;
use minnow_core::{Error, Result};
use minnow_store::{now_ms, Dict, SimpleSet, SortedSet};
use std::collections::HashMap;

/// A client request: uppercased name plus its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    /// Converts a decoded frame into a command
    ///
    /// Requests must be non-empty arrays of text frames; anything else is a
    /// protocol error.
    pub fn from_frame(frame: Frame) -> Result<Command> {
        let Frame::Array(items) = frame else {
            return Err(Error::Protocol("request is not an array".to_string()));
        };

        let mut tokens = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Frame::Bulk(text) | Frame::Simple(text) => tokens.push(text),
                Frame::Integer(value) => tokens.push(value.to_string()),
                _ => return Err(Error::Protocol("request argument is not text".to_string())),
            }
        }

        let mut tokens = tokens.into_iter();
        let name = tokens
            .next()
            .ok_or_else(|| Error::Protocol("empty request array".to_string()))?
            .to_uppercase();
        Ok(Command {
            name,
            args: tokens.collect(),
        })
    }
}

fn wrong_arity(name: &str) -> Frame {
    Frame::Error(format!(
        "ERR wrong number of arguments for '{name}' command"
    ))
}

/// The three typed stores, owned by the event loop
///
/// Each kind keeps a private map, so one key name may exist independently as
/// a string, a set and a sorted set.
#[derive(Default)]
pub struct Store {
    pub dict: Dict,
    sets: HashMap<String, SimpleSet>,
    zsets: HashMap<String, SortedSet>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            dict: Dict::new(),
            sets: HashMap::new(),
            zsets: HashMap::new(),
        }
    }

    /// Executes one command and returns the reply frame
    pub fn execute(&mut self, cmd: &Command) -> Frame {
        match cmd.name.as_str() {
            "PING" => ping(&cmd.args),
            "SET" => self.set(&cmd.args),
            "GET" => self.get(&cmd.args),
            "TTL" => self.ttl(&cmd.args),
            "SADD" => self.sadd(&cmd.args),
            "SREM" => self.srem(&cmd.args),
            "SISMEMBER" => self.sismember(&cmd.args),
            "SMEMBERS" => self.smembers(&cmd.args),
            "ZADD" => self.zadd(&cmd.args),
            "ZSCORE" => self.zscore(&cmd.args),
            "ZRANK" => self.zrank(&cmd.args),
            _ => Frame::Error("command not found".to_string()),
        }
    }

    // SET key value [EX seconds]
    fn set(&mut self, args: &[String]) -> Frame {
        if args.len() != 2 && args.len() != 4 {
            return wrong_arity("SET");
        }

        let mut ttl_ms = -1i64;
        if args.len() == 4 {
            if !args[2].eq_ignore_ascii_case("EX") {
                return Frame::Error("ERR syntax error".to_string());
            }
            match args[3].parse::<i64>() {
                Ok(seconds) => ttl_ms = seconds.saturating_mul(1000),
                Err(_) => {
                    return Frame::Error(
                        "ERR value is not an integer or out of range".to_string(),
                    )
                }
            }
        }

        self.dict.set(&args[0], args[1].clone(), ttl_ms);
        Frame::Simple("OK".to_string())
    }

    // GET key
    fn get(&mut self, args: &[String]) -> Frame {
        if args.len() != 1 {
            return wrong_arity("GET");
        }
        match self.dict.get(&args[0]) {
            Some(value) => Frame::Bulk(value.to_string()),
            None => Frame::Null,
        }
    }

    // TTL key: -2 missing key, -1 no deadline, else whole seconds remaining
    fn ttl(&mut self, args: &[String]) -> Frame {
        if args.len() != 1 {
            return wrong_arity("TTL");
        }

        let key = &args[0];
        if self.dict.get(key).is_none() {
            return Frame::Integer(-2);
        }
        let Some(deadline) = self.dict.expiry(key) else {
            return Frame::Integer(-1);
        };

        let now = now_ms();
        if deadline <= now {
            return Frame::Integer(-2);
        }
        Frame::Integer(((deadline - now) / 1000) as i64)
    }

    // SADD key member [member ...]
    fn sadd(&mut self, args: &[String]) -> Frame {
        if args.len() < 2 {
            return wrong_arity("SADD");
        }

        let key = &args[0];
        let set = self
            .sets
            .entry(key.clone())
            .or_insert_with(|| SimpleSet::new(key));
        Frame::Integer(set.add(&args[1..]) as i64)
    }

    // SREM key member [member ...]
    fn srem(&mut self, args: &[String]) -> Frame {
        if args.len() < 2 {
            return wrong_arity("SREM");
        }

        let key = &args[0];
        let set = self
            .sets
            .entry(key.clone())
            .or_insert_with(|| SimpleSet::new(key));
        Frame::Integer(set.remove(&args[1..]) as i64)
    }

    // SISMEMBER key member
    fn sismember(&mut self, args: &[String]) -> Frame {
        if args.len() != 2 {
            return wrong_arity("SISMEMBER");
        }
        let present = self
            .sets
            .get(&args[0])
            .is_some_and(|set| set.contains(&args[1]));
        Frame::Integer(i64::from(present))
    }

    // SMEMBERS key
    fn smembers(&mut self, args: &[String]) -> Frame {
        if args.len() != 1 {
            return wrong_arity("SMEMBERS");
        }
        let members = match self.sets.get(&args[0]) {
            Some(set) => set
                .members()
                .map(|member| Frame::Bulk(member.to_string()))
                .collect(),
            None => Vec::new(),
        };
        Frame::Array(members)
    }

    // ZADD key score member [score member ...]
    //
    // The reply counts per-pair operations performed, inserts and score
    // updates alike.
    fn zadd(&mut self, args: &[String]) -> Frame {
        if args.len() < 3 || (args.len() - 1) % 2 != 0 {
            return wrong_arity("ZADD");
        }

        let key = &args[0];
        let zset = self.zsets.entry(key.clone()).or_default();

        let mut count = 0i64;
        for pair in args[1..].chunks(2) {
            let score = match pair[0].parse::<f64>() {
                Ok(score) if !score.is_nan() => score,
                _ => return Frame::Error("ERR value is not a valid float".to_string()),
            };
            if !zset.add(score, &pair[1]) {
                return Frame::Error("ERR adding member failed".to_string());
            }
            count += 1;
        }
        Frame::Integer(count)
    }

    // ZSCORE key member
    fn zscore(&mut self, args: &[String]) -> Frame {
        if args.len() != 2 {
            return wrong_arity("ZSCORE");
        }
        match self.zsets.get(&args[0]).and_then(|z| z.score(&args[1])) {
            Some(score) => Frame::Bulk(format!("{score:.6}")),
            None => Frame::Null,
        }
    }

    // ZRANK key member: nil for a missing key, -1 for a missing member
    fn zrank(&mut self, args: &[String]) -> Frame {
        if args.len() != 2 {
            return wrong_arity("ZRANK");
        }
        match self.zsets.get(&args[0]) {
            Some(zset) => match zset.rank(&args[1], false) {
                Some(rank) => Frame::Integer(rank as i64),
                None => Frame::Integer(-1),
            },
            None => Frame::Null,
        }
    }
}

// PING [message]
fn ping(args: &[String]) -> Frame {
    match args {
        [] => Frame::Bulk("PONG".to_string()),
        [message] => Frame::Bulk(message.clone()),
        _ => wrong_arity("PING"),
    }
}
