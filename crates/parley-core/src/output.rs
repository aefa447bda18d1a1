//! Output channels.
//!
//! The robot never talks to a chat backend itself. [`Robot::say`] and
//! [`Robot::reply`] delegate to the installed [`OutputChannel`]; installing a
//! new one replaces the previous one, so the last plugin or adapter to call
//! [`Robot::set_output`] wins.
//!
//! The default [`EventOutput`] turns outgoing text into `say` and `reply`
//! events, which adapters subscribe to.

use crate::event::EventKind;
use crate::handler::HandlerResult;
use crate::matcher::Fields;
use crate::robot::Robot;

/// Destination for the robot's outgoing text.
pub trait OutputChannel: Send + Sync {
    /// Sends `text` to the conversation described by `fields`.
    fn say(&self, robot: &Robot, text: &str, fields: &Fields) -> HandlerResult;

    /// Sends `text` addressed to the `user` in `fields`.
    ///
    /// The default implementation prefixes the text with the robot's
    /// mention prefix for that user and calls [`say`](Self::say).
    fn reply(&self, robot: &Robot, text: &str, fields: &Fields) -> HandlerResult {
        let user = fields.get("user").and_then(|v| v.as_str());
        let line = format!("{}{}", robot.mention_prefix(user), text);
        self.say(robot, &line, fields)
    }
}

/// The default channel: re-emits outgoing text as events.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventOutput;

impl OutputChannel for EventOutput {
    fn say(&self, robot: &Robot, text: &str, fields: &Fields) -> HandlerResult {
        robot.emit(EventKind::Say, text, fields.clone());
        Ok(())
    }

    fn reply(&self, robot: &Robot, text: &str, fields: &Fields) -> HandlerResult {
        let user = fields.get("user").and_then(|v| v.as_str());
        let line = format!("{}{}", robot.mention_prefix(user), text);
        robot.emit(EventKind::Reply, &line, fields.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::fields;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl OutputChannel for Recorder {
        fn say(&self, _robot: &Robot, text: &str, _fields: &Fields) -> HandlerResult {
            self.lines.lock().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn default_reply_prefixes_user() {
        let robot = Robot::new("Robot");
        let recorder = Arc::new(Recorder::default());
        robot.set_output(recorder.clone());

        robot.reply("hi", &fields([("user", "alice")])).unwrap();
        robot.reply("hi", &Fields::new()).unwrap();

        assert_eq!(*recorder.lines.lock(), vec!["@alice hi", "@Robot hi"]);
    }

    #[test]
    fn event_output_emits_say_and_reply() {
        let robot = Robot::new("Robot");
        let seen = Arc::new(Mutex::new(Vec::new()));

        for kind in [EventKind::Say, EventKind::Reply] {
            let seen = Arc::clone(&seen);
            robot.on_any(kind.clone(), move |ctx| {
                seen.lock().push((kind.to_string(), ctx.message().to_string()));
            });
        }

        robot.say("hello", &Fields::new()).unwrap();
        robot.reply("yes", &fields([("user", "bob")])).unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                ("say".to_string(), "hello".to_string()),
                ("reply".to_string(), "@bob yes".to_string()),
            ]
        );
    }
}
