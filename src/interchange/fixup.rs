//! Deferred-reference fixup pass.
//!
//! Runs once, after every entity in the stream has been decoded and persisted, in a
//! fixed bucket order. Each relationship instance resolves independently: a missed
//! lookup fails only that instance, records a diagnostic, and never blocks the
//! remaining fixups or aborts the import.

// self
use crate::{
	_prelude::*,
	host::HostId,
	interchange::{
		DiagnosticKind, ImportReport,
		maps::{EntityKind, RemapTable},
	},
	store::Stores,
};

/// Resolves every deferred reference recorded during decode and re-persists the
/// affected entities.
pub(crate) fn fix_object_references(
	stores: &Stores,
	host: &HostId,
	maps: &RemapTable,
	report: &mut ImportReport,
) -> Result<()> {
	for (old_refresh_id, client_ref) in maps.refresh_token_client_refs() {
		let Some(new_refresh_id) = maps.new_id(EntityKind::RefreshToken, old_refresh_id) else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("No identifier mapping for refresh token {old_refresh_id}; leaving its client unset."),
			);

			continue;
		};
		let Some(client) = stores.clients.get_by_client_id(host, client_ref)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Refresh token {old_refresh_id} references unknown client {client_ref}."),
			);

			continue;
		};
		let Some(mut token) = stores.tokens.get_refresh_token_by_id(host, new_refresh_id)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Refresh token {old_refresh_id} vanished before fixup."),
			);

			continue;
		};

		token.client = client.id;
		stores.tokens.save_refresh_token(host, token)?;
	}

	for (old_refresh_id, old_holder_id) in maps.refresh_token_holder_refs() {
		let Some(new_holder_id) =
			maps.new_id(EntityKind::AuthenticationHolder, old_holder_id)
		else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("No identifier mapping for authentication holder {old_holder_id}; refresh token {old_refresh_id} keeps no holder."),
			);

			continue;
		};
		let Some(new_refresh_id) = maps.new_id(EntityKind::RefreshToken, old_refresh_id) else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("No identifier mapping for refresh token {old_refresh_id}; leaving its holder unset."),
			);

			continue;
		};
		let Some(holder) = stores.authentication_holders.get_by_id(host, new_holder_id)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Authentication holder {old_holder_id} vanished before fixup."),
			);

			continue;
		};
		let Some(mut token) = stores.tokens.get_refresh_token_by_id(host, new_refresh_id)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Refresh token {old_refresh_id} vanished before fixup."),
			);

			continue;
		};

		token.authentication_holder = holder.id;
		stores.tokens.save_refresh_token(host, token)?;
	}

	for (old_access_id, client_ref) in maps.access_token_client_refs() {
		let Some(new_access_id) = maps.new_id(EntityKind::AccessToken, old_access_id) else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("No identifier mapping for access token {old_access_id}; leaving its client unset."),
			);

			continue;
		};
		let Some(client) = stores.clients.get_by_client_id(host, client_ref)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Access token {old_access_id} references unknown client {client_ref}."),
			);

			continue;
		};
		let Some(mut token) = stores.tokens.get_access_token_by_id(host, new_access_id)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Access token {old_access_id} vanished before fixup."),
			);

			continue;
		};

		token.client = client.id;
		stores.tokens.save_access_token(host, token)?;
	}

	for (old_access_id, old_holder_id) in maps.access_token_holder_refs() {
		let Some(new_holder_id) =
			maps.new_id(EntityKind::AuthenticationHolder, old_holder_id)
		else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("No identifier mapping for authentication holder {old_holder_id}; access token {old_access_id} keeps no holder."),
			);

			continue;
		};
		let Some(new_access_id) = maps.new_id(EntityKind::AccessToken, old_access_id) else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("No identifier mapping for access token {old_access_id}; leaving its holder unset."),
			);

			continue;
		};
		let Some(holder) = stores.authentication_holders.get_by_id(host, new_holder_id)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Authentication holder {old_holder_id} vanished before fixup."),
			);

			continue;
		};
		let Some(mut token) = stores.tokens.get_access_token_by_id(host, new_access_id)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Access token {old_access_id} vanished before fixup."),
			);

			continue;
		};

		token.authentication_holder = holder.id;
		stores.tokens.save_access_token(host, token)?;
	}

	for (old_access_id, old_refresh_id) in maps.access_token_refresh_token_refs() {
		let Some(new_refresh_id) = maps.new_id(EntityKind::RefreshToken, old_refresh_id) else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("No identifier mapping for refresh token {old_refresh_id}; access token {old_access_id} keeps no pairing."),
			);

			continue;
		};
		let Some(new_access_id) = maps.new_id(EntityKind::AccessToken, old_access_id) else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("No identifier mapping for access token {old_access_id}; leaving its pairing unset."),
			);

			continue;
		};
		let Some(refresh) = stores.tokens.get_refresh_token_by_id(host, new_refresh_id)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Refresh token {old_refresh_id} vanished before fixup."),
			);

			continue;
		};
		let Some(mut token) = stores.tokens.get_access_token_by_id(host, new_access_id)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Access token {old_access_id} vanished before fixup."),
			);

			continue;
		};

		token.refresh_token = refresh.id;
		stores.tokens.save_access_token(host, token)?;
	}

	for (old_grant_id, old_token_ids) in maps.grant_access_token_refs() {
		let Some(new_grant_id) = maps.new_id(EntityKind::Grant, old_grant_id) else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("No identifier mapping for grant {old_grant_id}; leaving its tokens unset."),
			);

			continue;
		};
		let Some(mut site) = stores.approved_sites.get_by_id(host, new_grant_id)? else {
			report.record(
				DiagnosticKind::ReferenceResolution,
				format!("Grant {old_grant_id} vanished before fixup."),
			);

			continue;
		};

		for old_token_id in old_token_ids {
			let Some(new_token_id) = maps.new_id(EntityKind::AccessToken, old_token_id) else {
				report.record(
					DiagnosticKind::ReferenceResolution,
					format!("No identifier mapping for access token {old_token_id}; grant {old_grant_id} drops it."),
				);

				continue;
			};
			let Some(mut token) = stores.tokens.get_access_token_by_id(host, new_token_id)?
			else {
				report.record(
					DiagnosticKind::ReferenceResolution,
					format!("Access token {old_token_id} vanished before fixup."),
				);

				continue;
			};

			token.approved_site = site.id.clone();
			site.approved_access_tokens.push(new_token_id.clone());
			stores.tokens.save_access_token(host, token)?;
		}

		stores.approved_sites.save(host, site)?;
	}

	Ok(())
}
