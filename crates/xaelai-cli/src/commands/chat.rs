use super::Context;
use anyhow::Result;
use xaelai_core::{RunRecord, RunStore};
use xaelai_infrastructure::ChatHistorySession;

pub fn new(ctx: &Context, label: &str) -> Result<()> {
    let session = ChatHistorySession::create(ctx.chat_history_dir()?, label, ctx.codec())?;

    let record = RunRecord::new(session.record_id())
        .with_name(session.display_name())
        .with_user(ctx.user_id());
    session.store()?.create_new(&record)?;

    println!("{}", session.file_name());
    Ok(())
}

pub fn list(ctx: &Context) -> Result<()> {
    for file_name in ChatHistorySession::list(ctx.chat_history_dir()?, ctx.codec())? {
        println!("{}", file_name);
    }
    Ok(())
}

pub fn rename(ctx: &Context, file_name: &str, new_label: &str) -> Result<()> {
    let mut session = ChatHistorySession::open(ctx.chat_history_dir()?, file_name)?;
    session.rename(new_label)?;

    let store = session.store()?;
    if let Some(mut record) = store.read(session.record_id())? {
        record.rename(new_label);
        store.upsert(&record)?;
    }

    println!("{}", session.file_name());
    Ok(())
}
