use super::Context;
use anyhow::Result;
use xaelai_core::{MessageRole, RunRecord, RunStore, XaelaiError};

pub fn list(ctx: &Context) -> Result<()> {
    let listing = ctx.run_store()?.list_all()?;

    let mut records = listing.records;
    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    for record in &records {
        println!(
            "{}\t{}\t{} messages\t{}",
            record.run_id,
            record.run_name,
            record.messages.len(),
            record.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    for skipped in &listing.skipped {
        eprintln!("warning: could not load history for '{}'", skipped.run_id);
    }

    Ok(())
}

pub fn show(ctx: &Context, run_id: &str) -> Result<()> {
    let record = ctx
        .run_store()?
        .read(run_id)?
        .ok_or_else(|| XaelaiError::not_found(run_id))?;

    println!("{} ({})", record.run_name, record.run_id);
    for message in &record.messages {
        println!("[{}] {}", message.role, message.content);
    }
    Ok(())
}

pub fn create(ctx: &Context, run_id: Option<&str>) -> Result<()> {
    let record = match run_id {
        Some(id) => RunRecord::new(id),
        None => RunRecord::generated(),
    }
    .with_user(ctx.user_id());

    ctx.run_store()?.create_new(&record)?;
    println!("{}", record.run_id);
    Ok(())
}

pub fn rename(ctx: &Context, run_id: &str, name: &str) -> Result<()> {
    update(ctx, run_id, |record| record.rename(name))
}

pub fn append(ctx: &Context, run_id: &str, role: MessageRole, content: &str) -> Result<()> {
    update(ctx, run_id, |record| record.push_message(role, content))
}

pub fn delete(ctx: &Context, run_id: &str) -> Result<()> {
    ctx.run_store()?.delete(run_id)?;
    Ok(())
}

/// Read-modify-write of a whole record.
fn update(ctx: &Context, run_id: &str, f: impl FnOnce(&mut RunRecord)) -> Result<()> {
    let store = ctx.run_store()?;
    let mut record = store
        .read(run_id)?
        .ok_or_else(|| XaelaiError::not_found(run_id))?;

    f(&mut record);
    store.upsert(&record)?;
    Ok(())
}
