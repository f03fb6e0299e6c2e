//! Implements the `SheetsApi` trait using the `sheets::Client` to interact
//! with a Google spreadsheet.

use crate::api::{A1Range, SheetMeta, SheetRange, SheetsApi, SpreadsheetMeta};
use crate::error::{Error, Result};
use sheets::types::{
    BatchUpdateSpreadsheetRequest, BatchUpdateValuesRequest, DateTimeRenderOption,
    DeleteDimensionRequest, Dimension, DimensionRange, InsertDimensionRequest, Request,
    ValueInputOption, ValueRange, ValueRenderOption,
};
use sheets::ClientError;
use tracing::trace;

/// Talks to the real Google Sheets API. The access token is provisioned
/// outside of this program and handed in ready to use.
pub(super) struct GoogleSheets {
    client: sheets::Client,
}

impl GoogleSheets {
    pub(super) fn new(access_token: String) -> Self {
        // The sheets crate requires client_id, client_secret, and redirect_uri,
        // but we don't need them for API calls, only the access token.
        let client = sheets::Client::new(
            String::new(),
            String::new(),
            String::new(),
            access_token,
            String::new(),
        );
        Self { client }
    }
}

#[async_trait::async_trait]
impl SheetsApi for GoogleSheets {
    async fn metadata(&mut self, spreadsheet_id: &str) -> Result<SpreadsheetMeta> {
        trace!("metadata for {spreadsheet_id}");
        let response = self
            .client
            .spreadsheets()
            .get(spreadsheet_id, false, &[])
            .await
            .map_err(|e| map_client_error(e, &format!("spreadsheet '{spreadsheet_id}'")))?;

        let sheets = response
            .body
            .sheets
            .iter()
            .filter_map(|sheet| sheet.properties.as_ref())
            .map(|properties| SheetMeta {
                sheet_id: properties.sheet_id,
                title: properties.title.clone(),
            })
            .collect();

        Ok(SpreadsheetMeta {
            spreadsheet_id: response.body.spreadsheet_id.clone(),
            sheets,
        })
    }

    async fn read_range(
        &mut self,
        spreadsheet_id: &str,
        range: &A1Range,
    ) -> Result<Vec<Vec<String>>> {
        trace!("read_range {range}");
        let response = self
            .client
            .spreadsheets()
            .values_get(
                spreadsheet_id,
                &range.to_string(),
                DateTimeRenderOption::FormattedString,
                Dimension::Rows,
                ValueRenderOption::FormattedValue,
            )
            .await
            .map_err(|e| map_client_error(e, &format!("range '{range}'")))?;
        Ok(response.body.values)
    }

    async fn write_ranges(&mut self, spreadsheet_id: &str, data: &[SheetRange]) -> Result<()> {
        trace!("write_ranges: {} range(s)", data.len());
        let value_ranges: Vec<ValueRange> = data
            .iter()
            .map(|sr| ValueRange {
                major_dimension: Some(Dimension::Rows),
                range: sr.range.to_string(),
                values: sr.values.clone(),
            })
            .collect();

        let request = BatchUpdateValuesRequest {
            data: value_ranges,
            include_values_in_response: Some(false),
            response_date_time_render_option: None,
            response_value_render_option: None,
            // UserEntered makes the backend evaluate formula strings.
            value_input_option: Some(ValueInputOption::UserEntered),
        };

        self.client
            .spreadsheets()
            .values_batch_update(spreadsheet_id, &request)
            .await
            .map_err(|e| map_client_error(e, "batch write"))?;
        Ok(())
    }

    async fn insert_row(&mut self, spreadsheet_id: &str, sheet_id: i64, row: u32) -> Result<()> {
        trace!("insert_row {row} in sheet {sheet_id}");
        let request = BatchUpdateSpreadsheetRequest {
            requests: vec![Request {
                insert_dimension: Some(InsertDimensionRequest {
                    inherit_from_before: Some(row > 1),
                    range: Some(row_range(sheet_id, row)),
                }),
                ..empty_request()
            }],
            include_spreadsheet_in_response: None,
            response_include_grid_data: None,
            response_ranges: Vec::new(),
        };
        self.client
            .spreadsheets()
            .batch_update(spreadsheet_id, &request)
            .await
            .map_err(|e| map_client_error(e, &format!("insert row {row}")))?;
        Ok(())
    }

    async fn delete_row(&mut self, spreadsheet_id: &str, sheet_id: i64, row: u32) -> Result<()> {
        trace!("delete_row {row} in sheet {sheet_id}");
        let request = BatchUpdateSpreadsheetRequest {
            requests: vec![Request {
                delete_dimension: Some(DeleteDimensionRequest {
                    range: Some(row_range(sheet_id, row)),
                }),
                ..empty_request()
            }],
            include_spreadsheet_in_response: None,
            response_include_grid_data: None,
            response_ranges: Vec::new(),
        };
        self.client
            .spreadsheets()
            .batch_update(spreadsheet_id, &request)
            .await
            .map_err(|e| map_client_error(e, &format!("delete row {row}")))?;
        Ok(())
    }
}

/// A single-row dimension range. The API uses 0-based half-open indexes,
/// rows here are 1-based.
fn row_range(sheet_id: i64, row: u32) -> DimensionRange {
    DimensionRange {
        dimension: Some(Dimension::Rows),
        sheet_id,
        start_index: i64::from(row) - 1,
        end_index: i64::from(row),
    }
}

/// An otherwise-empty `Request` with every update field set to `None`. The
/// `sheets` types do not derive `Default`, so we spell out the empty value and
/// fill in the single desired update via struct-update syntax at the call site.
fn empty_request() -> Request {
    Request {
        add_banding: None,
        add_chart: None,
        add_conditional_format_rule: None,
        add_data_source: None,
        add_dimension_group: None,
        add_filter_view: None,
        add_named_range: None,
        add_protected_range: None,
        add_sheet: None,
        add_slicer: None,
        append_cells: None,
        append_dimension: None,
        auto_fill: None,
        auto_resize_dimensions: None,
        clear_basic_filter: None,
        copy_paste: None,
        create_developer_metadata: None,
        cut_paste: None,
        delete_banding: None,
        delete_conditional_format_rule: None,
        delete_data_source: None,
        delete_developer_metadata: None,
        delete_dimension: None,
        delete_dimension_group: None,
        delete_duplicates: None,
        delete_embedded_object: None,
        delete_filter_view: None,
        delete_named_range: None,
        delete_protected_range: None,
        delete_range: None,
        delete_sheet: None,
        duplicate_filter_view: None,
        duplicate_sheet: None,
        find_replace: None,
        insert_dimension: None,
        insert_range: None,
        merge_cells: None,
        move_dimension: None,
        paste_data: None,
        randomize_range: None,
        refresh_data_source: None,
        repeat_cell: None,
        set_basic_filter: None,
        set_data_validation: None,
        sort_range: None,
        text_to_columns: None,
        trim_whitespace: None,
        unmerge_cells: None,
        update_banding: None,
        update_borders: None,
        update_cells: None,
        update_chart_spec: None,
        update_conditional_format_rule: None,
        update_data_source: None,
        update_developer_metadata: None,
        update_dimension_group: None,
        update_dimension_properties: None,
        update_embedded_object_border: None,
        update_embedded_object_position: None,
        update_filter_view: None,
        update_named_range: None,
        update_protected_range: None,
        update_sheet_properties: None,
        update_slicer_spec: None,
        update_spreadsheet_properties: None,
    }
}

/// Maps backend failures onto the crate taxonomy: the engine needs to tell a
/// missing spreadsheet from a rejected credential from everything else.
fn map_client_error(e: ClientError, what: &str) -> Error {
    match &e {
        ClientError::HttpError { status, .. } => match status.as_u16() {
            404 => Error::ResourceNotFound(what.to_string()),
            401 | 403 => Error::PermissionDenied(what.to_string()),
            _ => Error::Unexpected(anyhow::Error::new(e).context(format!("HttpError on {what}"))),
        },
        _ => {
            let error_name = client_error_name(&e);
            Error::Unexpected(anyhow::Error::new(e).context(format!("{error_name} on {what}")))
        }
    }
}

fn client_error_name(e: &ClientError) -> String {
    match e {
        ClientError::EmptyRefreshToken => "EmptyRefreshToken".to_string(),
        ClientError::FromUtf8Error(inner) => format!("FromUtf8Error {inner}"),
        ClientError::UrlParserError(inner) => format!("UrlParserError {inner}"),
        ClientError::SerdeJsonError(inner) => format!("SerdeJsonError {inner}"),
        ClientError::ReqwestError(inner) => format!("ReqwestError {inner}"),
        ClientError::InvalidHeaderValue(inner) => format!("InvalidHeaderValue {inner}"),
        ClientError::ReqwestMiddleWareError(inner) => format!("ReqwestMiddleWareError {inner}"),
        ClientError::HttpError { .. } => "HttpError".to_string(),
        ClientError::Other(_) => "Other".to_string(),
    }
}
