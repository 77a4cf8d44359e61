/// Completes on the first SIGTERM or Ctrl+C. Only Ctrl+C is watched off Unix.
pub async fn wait_for_shutdown() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = term.recv() => tracing::debug!(signal = "SIGTERM", "received"),
            res = tokio::signal::ctrl_c() => {
                res?;
                tracing::debug!(signal = "SIGINT", "received");
            }
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}
