// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CUPS print backend.
//
// Queries and cancellation go straight to the scheduler over IPP with the
// `ipp` crate's async client. Every request names the gateway's user in
// `requesting-user-name`; without it CUPS treats the caller as anonymous,
// hides private job attributes and refuses to cancel jobs it does not own.
//   - CUPS-Get-Printers  (CUPS extension 0x4002)
//   - Get-Jobs           (RFC 8011 §4.2.6, `which-jobs`)
//   - Cancel-Job         (RFC 8011 §4.2.8, CUPS `purge-job`)
// Submission is delegated to `lp` (see `lp_client`), which handles document
// format detection and authentication the way the scheduler expects.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ipp::operation::IppOperation;
use ipp::prelude::*;
use tracing::{debug, error, info, instrument};

use printgate_core::GatewayConfig;
use printgate_core::error::{GatewayError, Result};
use printgate_core::types::{JobId, PrintJob, PrinterDescriptor};

use crate::backend::{JobScope, PrintBackend};
use crate::lp_client::LpSubmitter;

const REQUESTING_USER_NAME: &str = "requesting-user-name";

/// Print backend talking to one CUPS scheduler.
pub struct CupsClient {
    /// `host:port`, used in error messages.
    endpoint: String,
    /// `ipp://host:port/`, the scheduler root.
    server_uri: Uri,
    /// Sent as `requesting-user-name`; matches the owner of jobs `lp` submits.
    user: String,
    request_timeout: Duration,
    lp: LpSubmitter,
}

impl CupsClient {
    /// Create a client for the scheduler at `host:port`.
    ///
    /// Nothing is sent yet; an unusable host is reported as a connection
    /// error so callers treat it like an unreachable server.
    pub fn new(
        host: &str,
        port: u16,
        user: impl Into<String>,
        request_timeout: Duration,
        lp: LpSubmitter,
    ) -> Result<Self> {
        let endpoint = format!("{host}:{port}");
        let server_uri: Uri = format!("ipp://{endpoint}/")
            .parse()
            .map_err(|e| GatewayError::connection(&endpoint, format!("invalid address: {e}")))?;
        Ok(Self {
            endpoint,
            server_uri,
            user: user.into(),
            request_timeout,
            lp,
        })
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        Self::new(
            &config.print_server_host,
            config.print_server_port,
            config.print_user.clone(),
            config.backend_timeout,
            LpSubmitter::from_config(config),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn get_printers_request(&self) -> IppRequestResponse {
        let mut request = IppOperationBuilder::cups().get_printers().into_ipp_request();
        request.attributes_mut().add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new(
                REQUESTING_USER_NAME,
                IppValue::NameWithoutLanguage(self.user.clone().into()),
            ),
        );
        request
    }

    fn get_jobs_request(&self, scope: JobScope) -> IppRequestResponse {
        let mut request = IppOperationBuilder::get_jobs(self.server_uri.clone())
            .user_name(&self.user)
            .build()
            .into_ipp_request();
        let attrs = request.attributes_mut();
        attrs.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new("which-jobs", IppValue::Keyword(scope.ipp_keyword().into())),
        );
        attrs.add(
            DelimiterTag::OperationAttributes,
            IppAttribute::new("requested-attributes", IppValue::Keyword("all".into())),
        );
        request
    }

    fn cancel_job_request(&self, job_id: JobId, purge: bool) -> IppRequestResponse {
        let mut request = IppOperationBuilder::cancel_job(self.server_uri.clone(), job_id.get())
            .user_name(&self.user)
            .build()
            .into_ipp_request();
        if purge {
            request.attributes_mut().add(
                DelimiterTag::OperationAttributes,
                IppAttribute::new("purge-job", IppValue::Boolean(true)),
            );
        }
        request
    }

    /// Send one request; transport failures and timeouts become
    /// `GatewayError::Connection`. The IPP status is left to the caller.
    async fn send(&self, name: &str, request: IppRequestResponse) -> Result<IppRequestResponse> {
        let client = AsyncIppClient::new(self.server_uri.clone());

        debug!(operation = name, "sending IPP request");
        tokio::time::timeout(self.request_timeout, client.send(request))
            .await
            .map_err(|_| {
                GatewayError::connection(
                    &self.endpoint,
                    format!("{name} timed out after {}s", self.request_timeout.as_secs()),
                )
            })?
            .map_err(|e| GatewayError::connection(&self.endpoint, format!("{name}: {e}")))
    }
}

#[async_trait]
impl PrintBackend for CupsClient {
    #[instrument(skip(self), fields(server = %self.endpoint))]
    async fn list_printers(&self) -> Result<BTreeMap<String, PrinterDescriptor>> {
        let response = self
            .send("CUPS-Get-Printers", self.get_printers_request())
            .await?;
        ensure_success("CUPS-Get-Printers", &response)?;

        let printers = parse_printers(response.attributes());
        debug!(count = printers.len(), "received printer list");
        Ok(printers)
    }

    async fn submit_job(&self, printer_name: &str, file_path: &Path, job_title: &str) -> Result<()> {
        self.lp.submit(printer_name, file_path, job_title).await.map(|_| ())
    }

    #[instrument(skip(self), fields(server = %self.endpoint))]
    async fn list_jobs(&self, scope: JobScope) -> Result<Vec<PrintJob>> {
        let response = self.send("Get-Jobs", self.get_jobs_request(scope)).await?;
        ensure_success("Get-Jobs", &response)?;

        let jobs = parse_jobs(response.attributes());
        debug!(count = jobs.len(), "received job list");
        Ok(jobs)
    }

    #[instrument(skip(self), fields(server = %self.endpoint))]
    async fn cancel_job(&self, job_id: JobId, purge: bool) -> Result<()> {
        info!(%job_id, purge, "sending Cancel-Job");
        let response = self
            .send("Cancel-Job", self.cancel_job_request(job_id, purge))
            .await?;

        cancel_result(job_id, &response)?;
        info!(%job_id, "job cancelled");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helper functions for parsing IPP responses
// ---------------------------------------------------------------------------

/// Outcome of a Cancel-Job response. A missing or already finished job is
/// told apart from every other refusal.
fn cancel_result(job_id: JobId, response: &IppRequestResponse) -> Result<()> {
    match response.header().status_code() {
        StatusCode::ClientErrorNotFound | StatusCode::ClientErrorNotPossible => {
            error!(%job_id, "job not found or already finished");
            Err(GatewayError::JobNotFound(job_id))
        }
        _ => ensure_success("Cancel-Job", response),
    }
}

/// Turn a non-success IPP status into `GatewayError::PrintBackend`, carrying
/// the scheduler's `status-message` when it sent one.
fn ensure_success(name: &str, response: &IppRequestResponse) -> Result<()> {
    let status = response.header().status_code();
    if status.is_success() {
        return Ok(());
    }

    let detail = response
        .attributes()
        .groups_of(DelimiterTag::OperationAttributes)
        .find_map(|group| text_attr(group, "status-message"))
        .unwrap_or_else(|| format!("{status:?}"));
    error!(operation = name, status = ?status, detail = %detail, "IPP request failed");

    Err(GatewayError::PrintBackend {
        code: status as i32,
        message: format!("{name}: {detail}"),
    })
}

/// Integer or enum attribute value.
fn int_attr(group: &IppAttributeGroup, name: &str) -> Option<i32> {
    match group.attributes().get(name).map(|a| a.value()) {
        Some(IppValue::Integer(v)) | Some(IppValue::Enum(v)) => Some(*v),
        _ => None,
    }
}

/// Any attribute rendered as text; `no-value` and empty strings are `None`.
fn text_attr(group: &IppAttributeGroup, name: &str) -> Option<String> {
    match group.attributes().get(name).map(|a| a.value()) {
        None | Some(IppValue::NoValue) => None,
        Some(value) => Some(value.to_string()).filter(|s| !s.is_empty()),
    }
}

/// `time-at-*` attributes are seconds since the epoch; 0 means unset.
fn time_attr(group: &IppAttributeGroup, name: &str) -> Option<DateTime<Utc>> {
    int_attr(group, name)
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::from_timestamp(i64::from(secs), 0))
}

/// Last path segment of `ipp://host/printers/<name>`.
fn printer_from_uri(uri: &str) -> Option<String> {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && !name.contains(':'))
        .map(str::to_string)
}

/// Each printer arrives as its own Printer Attributes group.
fn parse_printers(attrs: &IppAttributes) -> BTreeMap<String, PrinterDescriptor> {
    attrs
        .groups_of(DelimiterTag::PrinterAttributes)
        .filter_map(|group| {
            let name = text_attr(group, "printer-name")?;
            let attributes = group
                .attributes()
                .iter()
                .map(|(key, attr)| (key.to_string(), attr.value().to_string()))
                .collect();
            Some((name.clone(), PrinterDescriptor { name, attributes }))
        })
        .collect()
}

/// Each job arrives as its own Job Attributes group.
fn parse_jobs(attrs: &IppAttributes) -> Vec<PrintJob> {
    attrs
        .groups_of(DelimiterTag::JobAttributes)
        .filter_map(job_from_group)
        .collect()
}

fn job_from_group(group: &IppAttributeGroup) -> Option<PrintJob> {
    let id = int_attr(group, "job-id").and_then(|id| JobId::new(i64::from(id)))?;

    let printer = text_attr(group, "printer-name").or_else(|| {
        text_attr(group, "job-printer-uri").and_then(|uri| printer_from_uri(&uri))
    });

    Some(PrintJob {
        id,
        printer,
        title: text_attr(group, "job-name"),
        user: text_attr(group, "job-originating-user-name"),
        state: int_attr(group, "job-state").unwrap_or(0),
        size_kb: int_attr(group, "job-k-octets").map(i64::from).unwrap_or(0),
        created_at: time_attr(group, "time-at-creation").unwrap_or(DateTime::UNIX_EPOCH),
        completed_at: time_attr(group, "time-at-completed"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CupsClient {
        let lp = LpSubmitter::new("lp", "localhost:631", Duration::from_secs(60));
        CupsClient::new("localhost", 631, "printdesk", Duration::from_secs(1), lp).unwrap()
    }

    #[test]
    fn new_accepts_host_and_port() {
        let client = client();
        assert_eq!(client.endpoint(), "localhost:631");
    }

    #[test]
    fn new_rejects_unusable_host() {
        let lp = LpSubmitter::new("lp", "x", Duration::from_secs(60));
        let result = CupsClient::new("not a host %%%", 631, "printdesk", Duration::from_secs(1), lp);
        assert!(matches!(result, Err(GatewayError::Connection { .. })));
    }

    fn operation_attr(request: &IppRequestResponse, name: &str) -> Option<String> {
        request
            .attributes()
            .groups_of(DelimiterTag::OperationAttributes)
            .find_map(|group| text_attr(group, name))
    }

    #[test]
    fn every_request_names_the_user() {
        let client = client();
        let requests = [
            client.get_printers_request(),
            client.get_jobs_request(JobScope::All),
            client.cancel_job_request(JobId::new(42).unwrap(), false),
        ];
        for request in &requests {
            assert_eq!(
                operation_attr(request, REQUESTING_USER_NAME).as_deref(),
                Some("printdesk")
            );
        }
    }

    #[test]
    fn get_jobs_request_asks_for_all_attributes() {
        let request = client().get_jobs_request(JobScope::NotCompleted);
        assert_eq!(operation_attr(&request, "which-jobs").as_deref(), Some("not-completed"));
        assert_eq!(operation_attr(&request, "requested-attributes").as_deref(), Some("all"));
    }

    #[test]
    fn cancel_request_carries_job_id_and_purge() {
        let client = client();
        let plain = client.cancel_job_request(JobId::new(42).unwrap(), false);
        let group = plain
            .attributes()
            .groups_of(DelimiterTag::OperationAttributes)
            .next()
            .unwrap();
        assert_eq!(int_attr(group, "job-id"), Some(42));
        assert_eq!(operation_attr(&plain, "purge-job"), None);

        let purged = client.cancel_job_request(JobId::new(i64::from(i32::MAX)).unwrap(), true);
        let purge = purged
            .attributes()
            .groups_of(DelimiterTag::OperationAttributes)
            .find_map(|group| group.attributes().get("purge-job").map(|a| a.value().clone()));
        assert!(matches!(purge, Some(IppValue::Boolean(true))));
    }

    fn response(status: StatusCode, message: Option<&str>) -> IppRequestResponse {
        let mut response = IppRequestResponse::new_response(IppVersion::v1_1(), status, 1);
        if let Some(message) = message {
            response.attributes_mut().add(
                DelimiterTag::OperationAttributes,
                IppAttribute::new("status-message", IppValue::TextWithoutLanguage(message.into())),
            );
        }
        response
    }

    #[test]
    fn cancel_succeeds_on_ok_status() {
        let id = JobId::new(7).unwrap();
        assert!(cancel_result(id, &response(StatusCode::SuccessfulOk, None)).is_ok());
    }

    #[test]
    fn cancel_of_missing_or_finished_job_is_job_not_found() {
        let id = JobId::new(7).unwrap();
        for status in [StatusCode::ClientErrorNotFound, StatusCode::ClientErrorNotPossible] {
            match cancel_result(id, &response(status, Some("Job #7 is already completed"))) {
                Err(GatewayError::JobNotFound(got)) => assert_eq!(got, id),
                other => panic!("unexpected result for {status:?}: {other:?}"),
            }
        }
    }

    #[test]
    fn other_cancel_refusals_keep_status_and_message() {
        let id = JobId::new(7).unwrap();
        let refused = response(StatusCode::ClientErrorForbidden, Some("Not authorized to cancel job"));
        match cancel_result(id, &refused) {
            Err(GatewayError::PrintBackend { code, message }) => {
                assert_eq!(code, StatusCode::ClientErrorForbidden as i32);
                assert!(message.contains("Not authorized to cancel job"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[tokio::test]
    async fn cancel_sent_over_the_wire_names_the_user() {
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let capture = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut seen = Vec::new();
            let mut buf = [0u8; 4096];
            while let Ok(Ok(n)) =
                tokio::time::timeout(Duration::from_secs(2), socket.read(&mut buf)).await
            {
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
                if contains(&seen, b"printdesk") {
                    break;
                }
            }
            seen
        });

        let lp = LpSubmitter::new("lp", "127.0.0.1", Duration::from_secs(60));
        let client =
            CupsClient::new("127.0.0.1", port, "printdesk", Duration::from_secs(5), lp).unwrap();
        // The listener hangs up without answering.
        assert!(client.cancel_job(JobId::new(42).unwrap(), false).await.is_err());

        let seen = capture.await.unwrap();
        assert!(contains(&seen, REQUESTING_USER_NAME.as_bytes()));
        assert!(contains(&seen, b"printdesk"));
    }

    #[test]
    fn printer_name_from_job_printer_uri() {
        assert_eq!(
            printer_from_uri("ipp://cups.lan:631/printers/Office_Laser").as_deref(),
            Some("Office_Laser")
        );
        assert_eq!(printer_from_uri("ipp://cups.lan:631/").as_deref(), None);
    }

    #[test]
    fn job_group_is_parsed() {
        let mut attrs = IppAttributes::new();
        for attr in [
            IppAttribute::new("job-id", IppValue::Integer(101)),
            IppAttribute::new("job-state", IppValue::Enum(9)),
            IppAttribute::new("job-name", IppValue::NameWithoutLanguage("Web Print: a.pdf".into())),
            IppAttribute::new("job-originating-user-name", IppValue::NameWithoutLanguage("alice".into())),
            IppAttribute::new("job-printer-uri", IppValue::Uri("ipp://cups/printers/Office".into())),
            IppAttribute::new("job-k-octets", IppValue::Integer(512)),
            IppAttribute::new("time-at-creation", IppValue::Integer(1_700_000_000)),
            IppAttribute::new("time-at-completed", IppValue::Integer(1_700_000_030)),
        ] {
            attrs.add(DelimiterTag::JobAttributes, attr);
        }

        let jobs = parse_jobs(&attrs);
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.id.get(), 101);
        assert_eq!(job.state, 9);
        assert_eq!(job.printer.as_deref(), Some("Office"));
        assert_eq!(job.title.as_deref(), Some("Web Print: a.pdf"));
        assert_eq!(job.user.as_deref(), Some("alice"));
        assert_eq!(job.size_kb, 512);
        assert_eq!(job.created_at.timestamp(), 1_700_000_000);
        assert_eq!(job.completed_at.map(|t| t.timestamp()), Some(1_700_000_030));
    }

    #[test]
    fn job_without_completion_time() {
        let mut attrs = IppAttributes::new();
        attrs.add(DelimiterTag::JobAttributes, IppAttribute::new("job-id", IppValue::Integer(5)));
        attrs.add(DelimiterTag::JobAttributes, IppAttribute::new("job-state", IppValue::Enum(3)));
        attrs.add(DelimiterTag::JobAttributes, IppAttribute::new("time-at-completed", IppValue::NoValue));

        let jobs = parse_jobs(&attrs);
        assert_eq!(jobs[0].completed_at, None);
        assert_eq!(jobs[0].printer, None);
    }

    #[test]
    fn printer_group_is_parsed() {
        let mut attrs = IppAttributes::new();
        attrs.add(
            DelimiterTag::PrinterAttributes,
            IppAttribute::new("printer-name", IppValue::NameWithoutLanguage("Office".into())),
        );
        attrs.add(
            DelimiterTag::PrinterAttributes,
            IppAttribute::new("printer-info", IppValue::TextWithoutLanguage("Second floor".into())),
        );

        let printers = parse_printers(&attrs);
        let office = &printers["Office"];
        assert_eq!(office.name, "Office");
        assert_eq!(office.attributes["printer-info"], "Second floor");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        // Port 9 (discard) on localhost is closed on any sane test machine.
        let lp = LpSubmitter::new("lp", "127.0.0.1:9", Duration::from_secs(60));
        let client = CupsClient::new("127.0.0.1", 9, "printdesk", Duration::from_secs(2), lp).unwrap();

        let err = client.list_jobs(JobScope::All).await.unwrap_err();
        assert!(err.is_connection(), "{err}");
    }
}
