// self
use oidc_interchange::{
	error::Error,
	host::HostId,
	interchange::{DataInterchange, FORMAT_1_1, FormatDirection, UnsupportedFormatError},
	store::Stores,
};

const JWT: &str = "eyJhbGciOiJub25lIn0.eyJqdGkiOiJsZWdhY3kifQ.c2ln";

fn host() -> HostId {
	HostId::new("host-test").expect("Host fixture should be valid.")
}

fn legacy_document() -> String {
	format!(
		r#"{{"interchange-1.1":{{
		"clients":[{{"clientId":"legacy-client","scope":["openid"]}}],
		"authenticationHolders":[{{
			"id":9,
			"authentication":{{
				"clientAuthorization":{{"clientId":"legacy-client","scope":["openid"],
					"denied":false,"extensions":"AAAA",
					"extensionStrings":{{"prompt":"login"}}}},
				"userAuthentication":"b64-blob-this-engine-never-reads",
				"savedUserAuthentication":{{"name":"bob","authenticated":true,
					"authorities":["ROLE_USER"]}}
			}}
		}}],
		"accessTokens":[{{"id":1,"clientId":"legacy-client","authenticationHolderId":9,
			"value":"{JWT}"}}],
		"systemScopes":[
			{{"value":"openid","allowDynReg":true,"defaultScope":true}},
			{{"value":"registration","allowDynReg":false,"structured":true,
			  "structuredParameter":"role"}}
		]
		}}}}"#
	)
}

#[test]
fn legacy_documents_import_through_the_dispatcher() {
	let stores = Stores::in_memory();
	let interchange = DataInterchange::new(stores.clone());
	let report = interchange
		.import_document(&legacy_document(), &host())
		.expect("Legacy import should succeed.");

	assert_eq!(report.counts.clients, 1);
	assert_eq!(report.counts.authentication_holders, 1);
	assert_eq!(report.counts.access_tokens, 1);
	assert_eq!(report.counts.system_scopes, 2);

	let holders = stores
		.authentication_holders
		.get_all(&host())
		.expect("Holder listing should succeed.");
	let request = holders[0]
		.request
		.as_ref()
		.expect("Nested client authorization should decode into a request.");

	assert!(request.approved, "denied=false must imply approval.");
	assert_eq!(request.extensions.get("prompt").map(String::as_str), Some("login"));

	let tokens =
		stores.tokens.get_all_access_tokens(&host()).expect("Token listing should succeed.");

	assert_eq!(
		tokens[0].authentication_holder, holders[0].id,
		"Legacy holder references must fix up like current ones."
	);

	let scopes =
		stores.system_scopes.get_all(&host()).expect("Scope listing should succeed.");
	let openid = scopes
		.iter()
		.find(|s| s.value.as_deref() == Some("openid"))
		.expect("openid scope should be present.");
	let registration = scopes
		.iter()
		.find(|s| s.value.as_deref() == Some("registration"))
		.expect("registration scope should be present.");

	assert!(!openid.restricted);
	assert!(registration.restricted, "allowDynReg=false inverts into restricted=true.");
}

#[test]
fn the_dispatcher_refuses_to_export_the_legacy_generation() {
	let interchange = DataInterchange::new(Stores::in_memory());
	let err = interchange
		.export_document(FORMAT_1_1, &host())
		.expect_err("There is no cross-version export path.");

	assert!(matches!(
		err,
		Error::UnsupportedFormat(UnsupportedFormatError {
			direction: FormatDirection::Export,
			..
		})
	));
}
