//! Session -- an open CAT connection to one transceiver.
//!
//! A [`Session`] owns its transport exclusively. Every operation takes
//! `&mut self`, so only one request/reply transaction can be in flight at a
//! time; if a session must be shared between tasks, wrap it in a
//! `tokio::sync::Mutex` so the discard/send/read sequence stays atomic.
//!
//! On top of the raw [`query`](Session::query) a session provides:
//!
//! - typed reads that decode the four known reply frames,
//! - the liveness check ([`probe`](Session::probe)) that tries to power
//!   the rig on once if it does not answer,
//! - one-line control commands that expect no reply.

use std::fmt;

use tracing::{debug, info, warn};

use kwdcat_core::{Error, Result, Transport};

use crate::commands::{self, Direction, NO_REPLY, Vfo};
use crate::frames::{InfoFrame, PowerFrame, StatusFrame, VfoFrequencyFrame};
use crate::query::{self, QueryConfig};

/// Whether the transceiver is answering CAT requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    /// Not checked yet.
    #[default]
    Unknown,
    /// Answered a status query.
    Responding,
    /// Did not answer, even after a power-on command and one retry.
    Unresponsive,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceState::Unknown => "unknown",
            DeviceState::Responding => "responding",
            DeviceState::Unresponsive => "unresponsive",
        };
        f.write_str(s)
    }
}

/// An open CAT connection.
///
/// Constructed via [`SessionBuilder`](crate::builder::SessionBuilder) or
/// [`Session::new`].
pub struct Session {
    transport: Box<dyn Transport>,
    config: QueryConfig,
    state: DeviceState,
}

impl Session {
    /// Wrap an already-open transport.
    pub fn new(transport: Box<dyn Transport>, config: QueryConfig) -> Self {
        Session {
            transport,
            config,
            state: DeviceState::Unknown,
        }
    }

    /// Timing parameters in use.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Result of the most recent liveness check.
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Send `request` and return its reply if one of `expected_len`
    /// characters arrived. See [`query::query`].
    pub async fn query(&mut self, request: &str, expected_len: usize) -> Result<Option<String>> {
        query::query(&mut *self.transport, &self.config, request, expected_len).await
    }

    /// Query and insist on a reply.
    async fn query_reply(&mut self, request: &str, expected_len: usize) -> Result<String> {
        self.query(request, expected_len)
            .await?
            .ok_or_else(|| Error::NoReply {
                request: request.to_string(),
            })
    }

    /// Send a request that expects no reply.
    async fn command(&mut self, request: &str) -> Result<()> {
        self.query(request, NO_REPLY).await.map(|_| ())
    }

    // ---------------------------------------------------------------
    // Typed reads
    // ---------------------------------------------------------------

    /// Read and decode the status frame (`IF`).
    pub async fn read_status(&mut self) -> Result<StatusFrame> {
        let (request, len) = commands::cmd_read_status();
        let reply = self.query_reply(request, len).await?;
        StatusFrame::decode(&reply).ok_or(Error::GrammarMismatch {
            frame: "IF",
            text: reply,
        })
    }

    /// Read and decode a VFO frequency (`FA`/`FB`).
    pub async fn read_vfo_frequency(&mut self, vfo: Vfo) -> Result<VfoFrequencyFrame> {
        let (request, len) = commands::cmd_read_vfo_frequency(vfo);
        let reply = self.query_reply(request, len).await?;
        VfoFrequencyFrame::decode(&reply).ok_or(Error::GrammarMismatch {
            frame: request,
            text: reply,
        })
    }

    /// Read and decode the extended info frame (`XI`).
    pub async fn read_info(&mut self) -> Result<InfoFrame> {
        let (request, len) = commands::cmd_read_info();
        let reply = self.query_reply(request, len).await?;
        InfoFrame::decode(&reply).ok_or(Error::GrammarMismatch {
            frame: "XI",
            text: reply,
        })
    }

    /// Read and decode the output power setting (`PC`).
    pub async fn read_power(&mut self) -> Result<PowerFrame> {
        let (request, len) = commands::cmd_read_power();
        let reply = self.query_reply(request, len).await?;
        PowerFrame::decode(&reply).ok_or(Error::GrammarMismatch {
            frame: "PC",
            text: reply,
        })
    }

    // ---------------------------------------------------------------
    // Liveness
    // ---------------------------------------------------------------

    /// Check whether the rig answers a status query.
    ///
    /// If it does not, send a power-on command, wait
    /// [`QueryConfig::power_on_delay`], and ask exactly once more. The
    /// outcome is stored and returned; transport failures are returned as
    /// errors and leave the state unchanged.
    pub async fn probe(&mut self) -> Result<DeviceState> {
        let (request, len) = commands::cmd_read_status();

        if self.answers(request, len).await? {
            info!("radio is answering");
            self.state = DeviceState::Responding;
            return Ok(self.state);
        }

        warn!("no answer to status query, trying to switch the radio on");
        self.command(&commands::cmd_set_power(true)).await?;
        tokio::time::sleep(self.config.power_on_delay).await;

        self.state = if self.answers(request, len).await? {
            info!("radio is now on");
            DeviceState::Responding
        } else {
            warn!("radio still not answering after power-on");
            DeviceState::Unresponsive
        };
        Ok(self.state)
    }

    /// Like [`probe`](Self::probe), but an unresponsive rig is an error.
    pub async fn ensure_responding(&mut self) -> Result<()> {
        match self.probe().await? {
            DeviceState::Responding => Ok(()),
            _ => Err(Error::Unresponsive),
        }
    }

    async fn answers(&mut self, request: &str, len: usize) -> Result<bool> {
        let reply = self.query(request, len).await?;
        debug!(?reply, "liveness status reply");
        Ok(reply.is_some_and(|r| !r.is_empty()))
    }

    // ---------------------------------------------------------------
    // Controls
    // ---------------------------------------------------------------

    /// Step the frequency up, like the microphone UP key.
    pub async fn frequency_up(&mut self) -> Result<()> {
        self.command(&commands::cmd_frequency_up()).await
    }

    /// Step the frequency down, like the microphone DWN key.
    pub async fn frequency_down(&mut self) -> Result<()> {
        self.command(&commands::cmd_frequency_down()).await
    }

    /// Step `vfo` by `steps` (0-99) in `direction`.
    pub async fn step_vfo(&mut self, vfo: Vfo, direction: Direction, steps: u8) -> Result<()> {
        let request = commands::cmd_step_vfo(vfo, direction, steps)?;
        self.command(&request).await
    }

    pub async fn rit_up(&mut self) -> Result<()> {
        self.command(&commands::cmd_rit_up()).await
    }

    pub async fn rit_down(&mut self) -> Result<()> {
        self.command(&commands::cmd_rit_down()).await
    }

    /// Switch RIT on or off.
    pub async fn set_rit(&mut self, on: bool) -> Result<()> {
        self.command(&commands::cmd_set_rit(on)).await
    }

    /// Switch XIT on or off.
    pub async fn set_xit(&mut self, on: bool) -> Result<()> {
        self.command(&commands::cmd_set_xit(on)).await
    }

    /// Power the transceiver on or off.
    pub async fn set_power(&mut self, on: bool) -> Result<()> {
        self.command(&commands::cmd_set_power(on)).await
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Consume the session and hand back its transport.
    pub fn into_transport(self) -> Box<dyn Transport> {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwdcat_test_harness::MockTransport;
    use std::time::Duration;

    const STATUS: &str = "IF00014050380      040000041020000080";

    fn make_session(mock: MockTransport) -> Session {
        Session::new(Box::new(mock), QueryConfig::default())
    }

    fn status_reply() -> Vec<u8> {
        format!("{STATUS};").into_bytes()
    }

    // -----------------------------------------------------------------
    // Typed reads
    // -----------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_read_status() {
        let mut mock = MockTransport::new();
        mock.expect(b"IF;", &status_reply());

        let mut session = make_session(mock);
        let status = session.read_status().await.unwrap();
        assert_eq!(status.frequency, "14.050380");
        assert_eq!(status.mode, '2');
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_vfo_a_frequency() {
        let mut mock = MockTransport::new();
        mock.expect(b"FA;", b"FA00014049680;");

        let mut session = make_session(mock);
        let frame = session.read_vfo_frequency(Vfo::A).await.unwrap();
        assert_eq!(frame.frequency, "14.049680");
        assert_eq!(frame.vfo, Vfo::A);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_vfo_b_frequency() {
        let mut mock = MockTransport::new();
        mock.expect(b"FB;", b"FB00007000000;");

        let mut session = make_session(mock);
        let frame = session.read_vfo_frequency(Vfo::B).await.unwrap();
        assert_eq!(frame.frequency, "7.000000");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_info() {
        let mut mock = MockTransport::new();
        mock.expect(b"XI;", b"XI000140496802000;");

        let mut session = make_session(mock);
        let info = session.read_info().await.unwrap();
        assert_eq!(info.frequency, "14.049680");
        assert_eq!(info.mode, '2');
        assert!(!info.data_mode());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_power() {
        let mut mock = MockTransport::new();
        mock.expect(b"PC;", b"PC050;");

        let mut session = make_session(mock);
        assert_eq!(session.read_power().await.unwrap().power, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_silent_is_no_reply() {
        let mut mock = MockTransport::new();
        mock.expect(b"PC;", b"");

        let mut session = make_session(mock);
        let err = session.read_power().await.unwrap_err();
        assert!(matches!(err, Error::NoReply { ref request } if request == "PC"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_grammar_mismatch() {
        // Correct length and terminator, but not digits.
        let mut mock = MockTransport::new();
        mock.expect(b"PC;", b"PC0X0;");

        let mut session = make_session(mock);
        let err = session.read_power().await.unwrap_err();
        assert!(matches!(err, Error::GrammarMismatch { frame: "PC", .. }));
    }

    // -----------------------------------------------------------------
    // Liveness
    // -----------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_probe_responding_first_try() {
        let mut mock = MockTransport::new();
        mock.expect(b"IF;", &status_reply());

        let mut session = make_session(mock);
        assert_eq!(session.state(), DeviceState::Unknown);
        assert_eq!(session.probe().await.unwrap(), DeviceState::Responding);
        assert_eq!(session.state(), DeviceState::Responding);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_powers_on_and_retries() {
        let mut mock = MockTransport::new();
        mock.expect(b"IF;", b"");
        mock.expect_write(b"PS1;");
        mock.expect(b"IF;", &status_reply());

        let mut session = make_session(mock);
        let started = tokio::time::Instant::now();
        assert_eq!(session.probe().await.unwrap(), DeviceState::Responding);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_unresponsive_after_one_retry() {
        let mut mock = MockTransport::new();
        mock.expect(b"IF;", b"");
        mock.expect_write(b"PS1;");
        mock.expect(b"IF;", b"");

        let mut session = make_session(mock);
        assert_eq!(session.probe().await.unwrap(), DeviceState::Unresponsive);
        assert_eq!(session.state(), DeviceState::Unresponsive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_responding_errors_when_unresponsive() {
        let mut mock = MockTransport::new();
        mock.expect(b"IF;", b"");
        mock.expect_write(b"PS1;");
        mock.expect(b"IF;", b"?;");

        let mut session = make_session(mock);
        let err = session.ensure_responding().await.unwrap_err();
        assert!(matches!(err, Error::Unresponsive));
    }

    #[tokio::test]
    async fn test_probe_write_failure_propagates() {
        let mut mock = MockTransport::new();
        mock.set_fail_writes(true);

        let mut session = make_session(mock);
        let err = session.probe().await.unwrap_err();
        assert!(matches!(err, Error::TransportWrite(_)));
        assert_eq!(session.state(), DeviceState::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_read_failure_keeps_previous_state() {
        let mut mock = MockTransport::new();
        mock.expect(b"IF;", &status_reply());
        mock.expect(b"IF;", &status_reply());
        // The first probe reads its reply in one receive.
        mock.fail_reads_after(1);

        let mut session = make_session(mock);
        assert_eq!(session.probe().await.unwrap(), DeviceState::Responding);

        let err = session.probe().await.unwrap_err();
        assert!(matches!(err, Error::TransportRead(_)));
        assert_eq!(session.state(), DeviceState::Responding);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_read_failure_from_unknown() {
        let mut mock = MockTransport::new();
        mock.expect(b"IF;", &status_reply());
        mock.set_fail_reads(true);

        let mut session = make_session(mock);
        let err = session.probe().await.unwrap_err();
        assert!(matches!(err, Error::TransportRead(_)));
        assert_eq!(session.state(), DeviceState::Unknown);
    }

    // -----------------------------------------------------------------
    // Controls
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_controls_send_expected_commands() {
        let mut mock = MockTransport::new();
        let cmds: [&[u8]; 8] = [
            b"UP;",
            b"DN;",
            b"UD0105;",
            b"RU;",
            b"RD;",
            b"RT1;",
            b"XT0;",
            b"PS0;",
        ];
        for cmd in cmds {
            mock.expect_write(cmd);
        }

        let mut session = make_session(mock);
        session.frequency_up().await.unwrap();
        session.frequency_down().await.unwrap();
        session.step_vfo(Vfo::A, Direction::Down, 5).await.unwrap();
        session.rit_up().await.unwrap();
        session.rit_down().await.unwrap();
        session.set_rit(true).await.unwrap();
        session.set_xit(false).await.unwrap();
        session.set_power(false).await.unwrap();
    }

    #[tokio::test]
    async fn test_step_vfo_out_of_range_sends_nothing() {
        let mock = MockTransport::new();
        let mut session = make_session(mock);

        let err = session
            .step_vfo(Vfo::B, Direction::Up, 150)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[tokio::test]
    async fn test_control_write_failure() {
        let mut mock = MockTransport::new();
        mock.set_fail_writes(true);

        let mut session = make_session(mock);
        assert!(matches!(
            session.set_rit(true).await,
            Err(Error::TransportWrite(_))
        ));
    }

    #[tokio::test]
    async fn test_close() {
        let mut session = make_session(MockTransport::new());
        session.close().await.unwrap();
        let transport = session.into_transport();
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_device_state_display() {
        assert_eq!(DeviceState::default().to_string(), "unknown");
        assert_eq!(DeviceState::Responding.to_string(), "responding");
        assert_eq!(DeviceState::Unresponsive.to_string(), "unresponsive");
    }
}
