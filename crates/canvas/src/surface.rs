use foundation::math::Vec2;

use crate::command::DrawCommand;

/// A drawing surface that accepts retained-mode commands.
pub trait Canvas {
    fn apply(&mut self, command: &DrawCommand);

    fn apply_all(&mut self, commands: &[DrawCommand]) {
        for command in commands {
            self.apply(command);
        }
    }
}

/// The floating detail box that follows the pointer.
pub trait TooltipSurface {
    fn show(&mut self, html: &str);
    fn hide(&mut self);
    fn move_to(&mut self, position: Vec2);
}

/// Records every command it receives.
#[derive(Debug, Default, Clone)]
pub struct CommandLog {
    pub commands: Vec<DrawCommand>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Canvas for CommandLog {
    fn apply(&mut self, command: &DrawCommand) {
        self.commands.push(command.clone());
    }
}

/// In-memory tooltip.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TooltipState {
    pub visible: bool,
    pub html: String,
    pub position: Option<Vec2>,
}

impl TooltipSurface for TooltipState {
    fn show(&mut self, html: &str) {
        self.visible = true;
        self.html = html.to_string();
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn move_to(&mut self, position: Vec2) {
        self.position = Some(position);
    }
}

#[cfg(test)]
mod tests {
    use super::{Canvas, CommandLog, TooltipState, TooltipSurface};
    use crate::command::DrawCommand;
    use foundation::math::Vec2;

    #[test]
    fn command_log_records_in_order() {
        let mut log = CommandLog::new();
        log.apply_all(&[DrawCommand::Clear, DrawCommand::Raise { id: "a".into() }]);
        assert_eq!(log.take().len(), 2);
        assert!(log.commands.is_empty());
    }

    #[test]
    fn tooltip_state_tracks_visibility() {
        let mut t = TooltipState::default();
        t.show("<h4>A</h4>");
        t.move_to(Vec2::new(1.0, 2.0));
        assert!(t.visible);
        t.hide();
        assert!(!t.visible);
        assert_eq!(t.html, "<h4>A</h4>");
        assert_eq!(t.position, Some(Vec2::new(1.0, 2.0)));
    }
}
