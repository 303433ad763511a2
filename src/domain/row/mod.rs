mod row;
pub use row::Row;

mod table;
pub use table::{
    export_file_name, RowTable, EMAIL_COLUMN, RFC_MESSAGE_ID_COLUMN, THREAD_ID_COLUMN,
};
