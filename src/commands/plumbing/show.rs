use crate::areas::repository::Repository;
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use std::io::Write;

impl Repository {
    pub fn show(&self, id: &str) -> anyhow::Result<()> {
        self.check()?;

        let object_id = ObjectId::try_parse(id.to_string())?;
        let record = self.database().parse_object_as_commit(&object_id)?;

        writeln!(self.writer(), "{}", record.display())?;

        Ok(())
    }
}
