// self
use oidc_interchange::{
	host::HostId,
	interchange::{DataService, DataService13, DiagnosticKind},
	store::Stores,
	stream::JsonReader,
};

const JWT_A: &str = "eyJhbGciOiJub25lIn0.eyJqdGkiOiJhIn0.c2ln";
const JWT_B: &str = "eyJhbGciOiJub25lIn0.eyJqdGkiOiJiIn0.c2ln";

fn host() -> HostId {
	HostId::new("host-test").expect("Host fixture should be valid.")
}

fn import(stores: &Stores, document: &str) -> oidc_interchange::interchange::ImportReport {
	let service = DataService13::new(stores.clone());
	let mut reader = JsonReader::parse(document).expect("Document fixture should parse.");

	service.import_data(&mut reader, &host()).expect("Import should succeed.")
}

#[test]
fn minimal_document_resolves_the_forward_client_reference() {
	let stores = Stores::in_memory();
	let document = format!(
		r#"{{"clients":[{{"clientId":"c1"}}],
		"accessTokens":[{{"id":101,"clientId":"c1","value":"{JWT_A}","scope":["read"]}}],
		"refreshTokens":[],"grants":[],"whitelistedSites":[],"blacklistedSites":[],
		"authenticationHolders":[],"systemScopes":[]}}"#
	);
	let report = import(&stores, &document);

	assert_eq!(report.counts.clients, 1);
	assert_eq!(report.counts.access_tokens, 1);
	assert!(report.diagnostics.is_empty(), "A clean document should produce no diagnostics.");

	let client = stores
		.clients
		.get_by_client_id(&host(), "c1")
		.expect("Client lookup should succeed.")
		.expect("Exactly one client should be persisted.");
	let tokens =
		stores.tokens.get_all_access_tokens(&host()).expect("Token listing should succeed.");

	assert_eq!(tokens.len(), 1);
	assert_eq!(tokens[0].client, client.id, "The token must point at the persisted client.");
	assert_eq!(tokens[0].scope.iter().collect::<Vec<_>>(), ["read"]);
}

#[test]
fn tokens_decoded_before_their_client_still_resolve() {
	let stores = Stores::in_memory();
	// The token section precedes the client section on purpose.
	let document = format!(
		r#"{{"accessTokens":[{{"id":7,"clientId":"late","value":"{JWT_A}"}}],
		"clients":[{{"clientId":"late"}}]}}"#
	);

	import(&stores, &document);

	let client = stores
		.clients
		.get_by_client_id(&host(), "late")
		.expect("Client lookup should succeed.")
		.expect("Client decoded after the token should be persisted.");
	let tokens =
		stores.tokens.get_all_access_tokens(&host()).expect("Token listing should succeed.");

	assert_eq!(tokens[0].client, client.id, "Forward references must resolve after fixup.");
}

#[test]
fn token_chains_resolve_across_all_buckets() {
	let stores = Stores::in_memory();
	let document = format!(
		r#"{{
		"refreshTokens":[{{"id":2,"clientId":"c1","authenticationHolderId":9,"value":"{JWT_B}"}}],
		"accessTokens":[{{"id":1,"clientId":"c1","authenticationHolderId":9,"refreshTokenId":2,"value":"{JWT_A}"}}],
		"authenticationHolders":[{{"id":9,"authorizationRequest":{{"clientId":"c1","approved":true}}}}],
		"clients":[{{"clientId":"c1"}}]
		}}"#
	);
	let report = import(&stores, &document);

	assert!(report.diagnostics.is_empty());

	let access =
		stores.tokens.get_all_access_tokens(&host()).expect("Token listing should succeed.");
	let refresh = stores
		.tokens
		.get_all_refresh_tokens(&host())
		.expect("Refresh listing should succeed.");
	let holders = stores
		.authentication_holders
		.get_all(&host())
		.expect("Holder listing should succeed.");

	assert_eq!(access[0].refresh_token, refresh[0].id);
	assert_eq!(access[0].authentication_holder, holders[0].id);
	assert_eq!(refresh[0].authentication_holder, holders[0].id);
	assert!(access[0].client.is_some());
	assert_eq!(access[0].client, refresh[0].client);
}

#[test]
fn grants_attach_resolved_access_tokens_and_drop_whitelist_markers() {
	let stores = Stores::in_memory();
	let document = format!(
		r#"{{
		"grants":[{{"id":4,"userId":"alice","clientId":"c1","whitelistedSiteId":33,
			"allowedScopes":["openid"],"approvedAccessTokens":[1],
			"creationDate":"2025-01-01T00:00:00Z"}}],
		"accessTokens":[{{"id":1,"clientId":"c1","value":"{JWT_A}"}}],
		"clients":[{{"clientId":"c1"}}]
		}}"#
	);
	let report = import(&stores, &document);

	assert_eq!(report.counts.grants, 1);
	assert!(
		report.diagnostics.is_empty(),
		"The whitelist marker is dropped silently, not diagnosed."
	);

	let sites =
		stores.approved_sites.get_all(&host()).expect("Grant listing should succeed.");
	let tokens =
		stores.tokens.get_all_access_tokens(&host()).expect("Token listing should succeed.");

	assert_eq!(sites[0].approved_access_tokens.len(), 1);
	assert_eq!(tokens[0].approved_site, sites[0].id);
	assert_eq!(sites[0].approved_access_tokens[0], tokens[0].id.clone().expect("Token id."));
}

#[test]
fn unrecognized_fields_and_sections_are_tolerated() {
	let stores = Stores::in_memory();
	let document = r#"{
		"futureSection":{"anything":[1,2,{"nested":true}]},
		"clients":[{"clientId":"c1","futureField":{"deep":["ignored"]},"scope":["openid"]}],
		"systemScopes":[{"value":"openid","unknownFlag":false}]
	}"#;
	let report = import(&stores, document);

	assert_eq!(report.counts.clients, 1);
	assert_eq!(report.counts.system_scopes, 1);
	assert!(report.diagnostics.is_empty(), "Unknown names are skipped, not diagnosed.");

	let client = stores
		.clients
		.get_by_client_id(&host(), "c1")
		.expect("Client lookup should succeed.")
		.expect("Client with an unknown field should still decode.");

	assert!(client.scope.contains("openid"));
}

#[test]
fn null_fields_are_skipped_unconditionally() {
	let stores = Stores::in_memory();
	let document = r#"{
		"clients":[{"clientId":"c1","secret":null,"scope":null,"tokenEndpointAuthMethod":null}]
	}"#;
	let report = import(&stores, document);

	assert_eq!(report.counts.clients, 1);
	assert!(report.diagnostics.is_empty());

	let client = stores
		.clients
		.get_by_client_id(&host(), "c1")
		.expect("Client lookup should succeed.")
		.expect("Client should be persisted.");

	assert_eq!(client.client_secret, None);
	assert!(client.scope.is_empty());
}

#[test]
fn unparseable_enum_fields_fail_only_that_field() {
	let stores = Stores::in_memory();
	let document = r#"{
		"clients":[{"clientId":"c1","tokenEndpointAuthMethod":"telepathy","subjectType":"public"}]
	}"#;
	let report = import(&stores, document);

	assert_eq!(report.counts.clients, 1);
	assert_eq!(report.diagnostics_of(DiagnosticKind::FieldDecode).count(), 1);

	let client = stores
		.clients
		.get_by_client_id(&host(), "c1")
		.expect("Client lookup should succeed.")
		.expect("Client should survive a bad enum literal.");

	assert_eq!(client.token_endpoint_auth_method, None);
	assert_eq!(
		client.subject_type,
		Some(oidc_interchange::model::SubjectType::Public),
		"Fields after the failed one must still decode."
	);
}

#[test]
fn unparseable_token_values_drop_only_that_token() {
	let stores = Stores::in_memory();
	let document = format!(
		r#"{{
		"accessTokens":[
			{{"id":1,"clientId":"c1","value":"not a jwt"}},
			{{"id":2,"clientId":"c1","value":"{JWT_A}"}}
		],
		"clients":[{{"clientId":"c1"}}]
		}}"#
	);
	let report = import(&stores, &document);

	assert_eq!(report.counts.access_tokens, 1, "Only the well-formed token survives.");
	assert!(report.diagnostics_of(DiagnosticKind::FieldDecode).count() >= 1);

	let tokens =
		stores.tokens.get_all_access_tokens(&host()).expect("Token listing should succeed.");

	assert_eq!(tokens.len(), 1);
}

#[test]
fn missing_reference_endpoints_are_diagnosed_not_fatal() {
	let stores = Stores::in_memory();
	let document = format!(
		r#"{{
		"accessTokens":[
			{{"id":1,"clientId":"ghost","authenticationHolderId":404,"value":"{JWT_A}"}},
			{{"id":2,"clientId":"real","value":"{JWT_B}"}}
		],
		"clients":[{{"clientId":"real"}}]
		}}"#
	);
	let report = import(&stores, &document);

	assert_eq!(report.counts.access_tokens, 2);
	assert_eq!(
		report.diagnostics_of(DiagnosticKind::ReferenceResolution).count(),
		2,
		"The unknown client and the unknown holder each cost one diagnostic."
	);

	let tokens =
		stores.tokens.get_all_access_tokens(&host()).expect("Token listing should succeed.");
	let resolved = tokens.iter().filter(|t| t.client.is_some()).count();

	assert_eq!(resolved, 1, "The resolvable token must still be fixed up.");
}

#[test]
fn imports_are_scoped_to_one_host() {
	let stores = Stores::in_memory();
	let service = DataService13::new(stores.clone());
	let host_a = HostId::new("host-a").expect("First host fixture should be valid.");
	let host_b = HostId::new("host-b").expect("Second host fixture should be valid.");
	let document = r#"{"clients":[{"clientId":"shared"}]}"#;
	let mut reader = JsonReader::parse(document).expect("Document fixture should parse.");

	service.import_data(&mut reader, &host_a).expect("Import into host A should succeed.");

	assert!(
		stores
			.clients
			.get_by_client_id(&host_b, "shared")
			.expect("Cross-host lookup should succeed.")
			.is_none(),
		"Entities must not cross tenant boundaries."
	);
	assert!(
		stores
			.clients
			.get_by_client_id(&host_a, "shared")
			.expect("Same-host lookup should succeed.")
			.is_some()
	);
}

#[test]
fn malformed_nesting_aborts_the_import() {
	let stores = Stores::in_memory();
	let service = DataService13::new(stores);
	// The clients section holds a bare scalar where an array must start.
	let document = r#"{"clients": 42}"#;
	let mut reader = JsonReader::parse(document).expect("Document fixture should parse.");
	let err = service
		.import_data(&mut reader, &host())
		.expect_err("Structural misuse must abort the import.");

	assert!(matches!(err, oidc_interchange::error::Error::Stream(_)));
}
