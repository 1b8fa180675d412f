use crate::areas::repository::Repository;
use crate::artifacts::log::sink::{PagerSink, WriterSink};
use crate::artifacts::log::walker::render_history;
use is_terminal::IsTerminal;

impl Repository {
    /// Render the commit history, newest first, through a pager when stdout
    /// is a terminal and straight to the writer otherwise.
    pub fn log(&self) -> anyhow::Result<()> {
        self.check()?;

        if std::io::stdout().is_terminal() {
            let mut sink = PagerSink::new();
            render_history(self, &mut sink)?;
        } else {
            let mut writer = self.writer();
            let mut sink = WriterSink::new(&mut **writer);
            render_history(self, &mut sink)?;
        }

        Ok(())
    }
}
